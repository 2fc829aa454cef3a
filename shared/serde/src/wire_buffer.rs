use crate::{primitive::Primitive, SerdeErr, TextEncoding};

/// A fixed-capacity byte buffer with a single cursor.
///
/// A buffer alternates between a write session and a read session. Writes
/// advance `position` and raise `length` (the high-water mark of written
/// bytes). [`WireBuffer::seek_to_begin`] turns the current write session into
/// a read session without copying: the write cursor becomes the end of the
/// readable data and the cursor moves back to 0.
///
/// The backing storage never grows. A write that does not fit fails with
/// [`SerdeErr::CapacityExceeded`] and leaves the buffer untouched.
pub struct WireBuffer {
    storage: Box<[u8]>,
    position: usize,
    length: usize,
    encoding: TextEncoding,
}

impl WireBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: vec![0; capacity].into_boxed_slice(),
            position: 0,
            length: 0,
            encoding: TextEncoding::default(),
        }
    }

    /// Wraps a copy of `bytes`, ready to be read from the start
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            storage: bytes.to_vec().into_boxed_slice(),
            position: 0,
            length: bytes.len(),
            encoding: TextEncoding::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn set_encoding(&mut self, encoding: TextEncoding) {
        self.encoding = encoding;
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Current cursor, shared by reads and writes
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of valid bytes in the buffer
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Bytes left to read before `len()`
    pub fn remaining(&self) -> usize {
        self.length.saturating_sub(self.position)
    }

    /// Bytes left to write before `capacity()`
    pub fn free(&self) -> usize {
        self.storage.len() - self.position
    }

    pub fn set_position(&mut self, position: usize) -> Result<(), SerdeErr> {
        if position > self.length {
            return Err(SerdeErr::InvalidPosition {
                position,
                length: self.length,
            });
        }
        self.position = position;
        Ok(())
    }

    /// Ends the write session: everything written so far becomes readable
    /// and the cursor returns to the start.
    pub fn seek_to_begin(&mut self) {
        self.length = self.position;
        self.position = 0;
    }

    /// Forgets all content without touching the backing memory
    pub fn reset(&mut self) {
        self.position = 0;
        self.length = 0;
    }

    /// Forgets all content and zeroes the backing memory
    pub fn clear(&mut self) {
        self.storage.fill(0);
        self.reset();
    }

    /// All valid bytes, independent of the cursor
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage[..self.length]
    }

    /// Valid bytes that have not been read yet
    pub fn unread(&self) -> &[u8] {
        &self.storage[self.position..self.length]
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    // Raw bytes

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SerdeErr> {
        let end = self.reserve(bytes.len())?;
        self.storage[self.position..end].copy_from_slice(bytes);
        self.advance_write(end);
        Ok(())
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&[u8], SerdeErr> {
        let start = self.position;
        let end = self.take(count)?;
        Ok(&self.storage[start..end])
    }

    /// Reads everything up to `len()`
    pub fn read_remaining(&mut self) -> &[u8] {
        let start = self.position;
        self.position = self.length.max(start);
        &self.storage[start..self.position]
    }

    /// Writes a varint byte count followed by the bytes themselves
    pub fn write_prefixed_bytes(&mut self, bytes: &[u8]) -> Result<(), SerdeErr> {
        let prefix = crate::varint::var_u32_len(bytes.len() as u32);
        self.ensure_free(prefix + bytes.len())?;
        self.write_var_u32(bytes.len() as u32)?;
        self.write_bytes(bytes)
    }

    pub fn read_prefixed_bytes(&mut self) -> Result<&[u8], SerdeErr> {
        let length = self.read_var_u32()? as usize;
        self.read_bytes(length)
    }

    // Primitives

    pub fn write<T: Primitive>(&mut self, value: T) -> Result<(), SerdeErr> {
        let end = self.reserve(T::SIZE)?;
        value.write_le(&mut self.storage[self.position..end]);
        self.advance_write(end);
        Ok(())
    }

    pub fn read<T: Primitive>(&mut self) -> Result<T, SerdeErr> {
        let start = self.position;
        let end = self.take(T::SIZE)?;
        Ok(T::read_le(&self.storage[start..end]))
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), SerdeErr> {
        self.write(value)
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), SerdeErr> {
        self.write(value)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), SerdeErr> {
        self.write(value)
    }

    pub fn write_i32(&mut self, value: i32) -> Result<(), SerdeErr> {
        self.write(value)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), SerdeErr> {
        self.write(value)
    }

    pub fn write_i64(&mut self, value: i64) -> Result<(), SerdeErr> {
        self.write(value)
    }

    pub fn write_u64(&mut self, value: u64) -> Result<(), SerdeErr> {
        self.write(value)
    }

    pub fn write_f32(&mut self, value: f32) -> Result<(), SerdeErr> {
        self.write(value)
    }

    pub fn write_f64(&mut self, value: f64) -> Result<(), SerdeErr> {
        self.write(value)
    }

    pub fn read_bool(&mut self) -> Result<bool, SerdeErr> {
        self.read()
    }

    pub fn read_u8(&mut self) -> Result<u8, SerdeErr> {
        self.read()
    }

    pub fn read_u16(&mut self) -> Result<u16, SerdeErr> {
        self.read()
    }

    pub fn read_i32(&mut self) -> Result<i32, SerdeErr> {
        self.read()
    }

    pub fn read_u32(&mut self) -> Result<u32, SerdeErr> {
        self.read()
    }

    pub fn read_i64(&mut self) -> Result<i64, SerdeErr> {
        self.read()
    }

    pub fn read_u64(&mut self) -> Result<u64, SerdeErr> {
        self.read()
    }

    pub fn read_f32(&mut self) -> Result<f32, SerdeErr> {
        self.read()
    }

    pub fn read_f64(&mut self) -> Result<f64, SerdeErr> {
        self.read()
    }

    // Strings

    /// Writes a varint byte-length prefix followed by the encoded text
    pub fn write_string(&mut self, value: &str) -> Result<(), SerdeErr> {
        let encoded = self.encoding.encode(value);
        self.write_prefixed_bytes(&encoded)
    }

    pub fn read_string(&mut self) -> Result<String, SerdeErr> {
        let encoding = self.encoding;
        let bytes = self.read_prefixed_bytes()?;
        encoding.decode(bytes)
    }

    // Arrays

    /// Writes a varint byte-count prefix followed by every element
    pub fn write_array<T: Primitive>(&mut self, values: &[T]) -> Result<(), SerdeErr> {
        let byte_count = values.len() * T::SIZE;
        let prefix = crate::varint::var_u32_len(byte_count as u32);
        self.ensure_free(prefix + byte_count)?;
        self.write_var_u32(byte_count as u32)?;
        for value in values {
            self.write(*value)?;
        }
        Ok(())
    }

    pub fn read_array<T: Primitive>(&mut self) -> Result<Vec<T>, SerdeErr> {
        let byte_count = self.read_var_u32()? as usize;
        if byte_count % T::SIZE != 0 {
            return Err(SerdeErr::InvalidLength {
                length: byte_count,
                element_size: T::SIZE,
            });
        }
        if byte_count > self.remaining() {
            return Err(SerdeErr::EndOfBuffer {
                requested: byte_count,
                available: self.remaining(),
            });
        }
        let mut output = Vec::with_capacity(byte_count / T::SIZE);
        for _ in 0..byte_count / T::SIZE {
            output.push(self.read::<T>()?);
        }
        Ok(output)
    }

    // Cursor bookkeeping

    pub(crate) fn ensure_free(&self, count: usize) -> Result<(), SerdeErr> {
        if count > self.free() {
            return Err(SerdeErr::CapacityExceeded {
                requested: count,
                available: self.free(),
            });
        }
        Ok(())
    }

    fn reserve(&self, count: usize) -> Result<usize, SerdeErr> {
        self.ensure_free(count)?;
        Ok(self.position + count)
    }

    fn advance_write(&mut self, end: usize) {
        self.position = end;
        if end > self.length {
            self.length = end;
        }
    }

    fn take(&mut self, count: usize) -> Result<usize, SerdeErr> {
        if count > self.remaining() {
            return Err(SerdeErr::EndOfBuffer {
                requested: count,
                available: self.remaining(),
            });
        }
        self.position += count;
        Ok(self.position)
    }
}

impl std::fmt::Debug for WireBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireBuffer")
            .field("position", &self.position)
            .field("length", &self.length)
            .field("capacity", &self.storage.len())
            .finish()
    }
}
