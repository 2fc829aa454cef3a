use thiserror::Error;

/// Errors that can occur while reading from or writing to a [`WireBuffer`](crate::WireBuffer)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// A write would run past the fixed capacity of the buffer
    #[error("Cannot write {requested} bytes: only {available} bytes of capacity remain. Buffers never grow, rent a larger one")]
    CapacityExceeded { requested: usize, available: usize },

    /// A read would run past the readable length of the buffer
    #[error("Cannot read {requested} bytes: only {available} readable bytes remain")]
    EndOfBuffer { requested: usize, available: usize },

    /// The final byte of a 7-bit encoded integer carried bits that do not fit the target type
    #[error("Malformed {bits}-bit varint: the final byte overflows the target type")]
    VarIntOverflow { bits: u8 },

    /// A length prefix does not describe a whole number of elements
    #[error("Length prefix of {length} bytes is not a multiple of the element size {element_size}")]
    InvalidLength { length: usize, element_size: usize },

    /// String bytes could not be decoded with the configured text encoding
    #[error("String payload is not valid UTF-8")]
    InvalidText,

    /// A cursor move pointed outside of the readable region
    #[error("Position {position} is outside the {length} readable bytes")]
    InvalidPosition { position: usize, length: usize },

    /// A tagged value carried a tag this build does not understand
    #[error("Unknown tag {tag} while decoding {type_name}")]
    UnknownTag { tag: u8, type_name: &'static str },
}
