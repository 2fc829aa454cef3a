//! 7-bit continuation encoding: each byte carries 7 bits of the value, low
//! group first, with the high bit set while more bytes follow. Negative
//! values are encoded through their two's complement bit pattern, so a
//! negative `i32` always takes 5 bytes and a negative `i64` 10 bytes.

use crate::{SerdeErr, WireBuffer};

const MAX_U32_BYTES: usize = 5;
const MAX_U64_BYTES: usize = 10;

pub(crate) fn var_u32_len(mut value: u32) -> usize {
    let mut count = 1;
    while value > 0x7F {
        value >>= 7;
        count += 1;
    }
    count
}

pub(crate) fn var_u64_len(mut value: u64) -> usize {
    let mut count = 1;
    while value > 0x7F {
        value >>= 7;
        count += 1;
    }
    count
}

impl WireBuffer {
    pub fn write_var_u32(&mut self, mut value: u32) -> Result<(), SerdeErr> {
        self.ensure_free(var_u32_len(value))?;
        while value > 0x7F {
            self.write_u8((value as u8) | 0x80)?;
            value >>= 7;
        }
        self.write_u8(value as u8)
    }

    pub fn write_var_i32(&mut self, value: i32) -> Result<(), SerdeErr> {
        self.write_var_u32(value as u32)
    }

    pub fn write_var_u64(&mut self, mut value: u64) -> Result<(), SerdeErr> {
        self.ensure_free(var_u64_len(value))?;
        while value > 0x7F {
            self.write_u8((value as u8) | 0x80)?;
            value >>= 7;
        }
        self.write_u8(value as u8)
    }

    pub fn write_var_i64(&mut self, value: i64) -> Result<(), SerdeErr> {
        self.write_var_u64(value as u64)
    }

    /// Reads at most 5 bytes. The 5th byte may only carry the 4 bits that
    /// are left of a 32-bit value.
    pub fn read_var_u32(&mut self) -> Result<u32, SerdeErr> {
        let mut result: u32 = 0;
        for index in 0..MAX_U32_BYTES - 1 {
            let byte = self.read_u8()?;
            result |= u32::from(byte & 0x7F) << (7 * index);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }

        let last = self.read_u8()?;
        if last > 0b1111 {
            return Err(SerdeErr::VarIntOverflow { bits: 32 });
        }
        Ok(result | (u32::from(last) << 28))
    }

    pub fn read_var_i32(&mut self) -> Result<i32, SerdeErr> {
        self.read_var_u32().map(|value| value as i32)
    }

    /// Reads at most 10 bytes. The 10th byte may only carry the single bit
    /// that is left of a 64-bit value.
    pub fn read_var_u64(&mut self) -> Result<u64, SerdeErr> {
        let mut result: u64 = 0;
        for index in 0..MAX_U64_BYTES - 1 {
            let byte = self.read_u8()?;
            result |= u64::from(byte & 0x7F) << (7 * index);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }

        let last = self.read_u8()?;
        if last > 0b1 {
            return Err(SerdeErr::VarIntOverflow { bits: 64 });
        }
        Ok(result | (u64::from(last) << 63))
    }

    pub fn read_var_i64(&mut self) -> Result<i64, SerdeErr> {
        self.read_var_u64().map(|value| value as i64)
    }
}
