use std::{
    ops::{Deref, DerefMut},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use log::trace;
use parking_lot::Mutex;

use crate::{TextEncoding, WireBuffer};

/// A thread-safe pool of equally sized [`WireBuffer`]s.
///
/// Rentals are returned to the pool when the [`PooledBuffer`] guard drops,
/// so every rented buffer comes back exactly once.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    free: Mutex<Vec<WireBuffer>>,
    buffer_capacity: usize,
    max_pooled: usize,
    encoding: TextEncoding,
    outstanding: AtomicUsize,
}

impl BufferPool {
    pub fn new(buffer_capacity: usize, max_pooled: usize) -> Self {
        Self::with_encoding(buffer_capacity, max_pooled, TextEncoding::default())
    }

    pub fn with_encoding(buffer_capacity: usize, max_pooled: usize, encoding: TextEncoding) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                free: Mutex::new(Vec::new()),
                buffer_capacity,
                max_pooled,
                encoding,
                outstanding: AtomicUsize::new(0),
            }),
        }
    }

    pub fn buffer_capacity(&self) -> usize {
        self.inner.buffer_capacity
    }

    /// Rents an empty buffer of the pool's standard capacity
    pub fn rent(&self) -> PooledBuffer {
        let buffer = self.inner.free.lock().pop();
        let mut buffer = buffer.unwrap_or_else(|| {
            trace!(
                "buffer pool empty, allocating {} bytes",
                self.inner.buffer_capacity
            );
            WireBuffer::with_capacity(self.inner.buffer_capacity)
        });
        buffer.reset();
        buffer.set_encoding(self.inner.encoding);
        self.track_rent(buffer)
    }

    /// Rents a buffer of at least `capacity` bytes. Oversized rentals are
    /// allocated on demand and discarded instead of pooled.
    pub fn rent_at_least(&self, capacity: usize) -> PooledBuffer {
        if capacity <= self.inner.buffer_capacity {
            return self.rent();
        }
        let buffer =
            WireBuffer::with_capacity(capacity).with_encoding(self.inner.encoding);
        self.track_rent(buffer)
    }

    /// Rents a buffer holding a copy of `bytes`, positioned for reading
    pub fn rent_filled(&self, bytes: &[u8]) -> PooledBuffer {
        let mut buffer = self.rent_at_least(bytes.len());
        // capacity is at least bytes.len(), this cannot fail
        if buffer.write_bytes(bytes).is_ok() {
            buffer.seek_to_begin();
        }
        buffer
    }

    /// Buffers currently idle in the pool
    pub fn available(&self) -> usize {
        self.inner.free.lock().len()
    }

    /// Buffers currently rented out
    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::Acquire)
    }

    fn track_rent(&self, buffer: WireBuffer) -> PooledBuffer {
        self.inner.outstanding.fetch_add(1, Ordering::AcqRel);
        PooledBuffer {
            buffer: Some(buffer),
            pool: self.clone(),
        }
    }

    fn give_back(&self, buffer: WireBuffer) {
        let previous = self
            .inner
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            });
        if previous.is_err() {
            // tolerated in release builds
            debug_assert!(
                false,
                "buffer returned to the pool more often than it was rented"
            );
            return;
        }

        if buffer.capacity() != self.inner.buffer_capacity {
            return;
        }
        let mut free = self.inner.free.lock();
        if free.len() < self.inner.max_pooled {
            free.push(buffer);
        }
    }
}

/// A rented [`WireBuffer`], handed back to its pool on drop
pub struct PooledBuffer {
    buffer: Option<WireBuffer>,
    pool: BufferPool,
}

impl PooledBuffer {
    /// Detaches the buffer from the pool; it will not be returned
    pub fn into_inner(mut self) -> WireBuffer {
        self.pool.inner.outstanding.fetch_sub(1, Ordering::AcqRel);
        match self.buffer.take() {
            Some(buffer) => buffer,
            None => WireBuffer::with_capacity(0),
        }
    }
}

impl Deref for PooledBuffer {
    type Target = WireBuffer;

    fn deref(&self) -> &WireBuffer {
        match &self.buffer {
            Some(buffer) => buffer,
            None => unreachable!("pooled buffer used after it was returned"),
        }
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut WireBuffer {
        match &mut self.buffer {
            Some(buffer) => buffer,
            None => unreachable!("pooled buffer used after it was returned"),
        }
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.pool.give_back(buffer);
        }
    }
}
