use thiserror::Error;

use rally_serde::SerdeErr;

use crate::handshake::CryptoError;

/// Errors raised while framing or unframing a message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The frame body could not be read or written
    #[error("Malformed frame: {0}")]
    Serde(#[from] SerdeErr),

    /// A zero-length packet carries no message type
    #[error("Received an empty frame")]
    Empty,

    /// Custom message kinds must not collide with reserved message types
    #[error("Custom message kind {kind} is reserved, custom kinds start at {first}")]
    ReservedKind { kind: u8, first: u8 },

    /// A response carried a status byte this build does not understand
    #[error("Unknown response status {status}")]
    UnknownResponseStatus { status: u8 },

    /// An encrypted frame is too short to hold its nonce
    #[error("Encrypted frame of {length} bytes is shorter than its {minimum}-byte envelope")]
    TooShort { length: usize, minimum: usize },

    /// The frame could not be encrypted or decrypted
    #[error("Frame cipher failed: {0}")]
    Crypto(#[from] CryptoError),
}
