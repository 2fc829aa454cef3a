//! # Rally Serde
//! Cursor-based wire buffers with little-endian primitives, 7-bit varints,
//! length-prefixed strings and arrays, and a thread-safe buffer pool.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod error;
mod pool;
mod primitive;
mod serde;
mod text_encoding;
mod varint;
mod wire_buffer;

pub use error::SerdeErr;
pub use pool::{BufferPool, PooledBuffer};
pub use primitive::Primitive;
pub use serde::{Serde, VarU32};
pub use text_encoding::TextEncoding;
pub use wire_buffer::WireBuffer;
