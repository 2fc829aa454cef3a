use thiserror::Error;

/// Errors raised by a [`HandshakeCrypto`](super::HandshakeCrypto) implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// A key had the wrong size for the algorithm
    #[error("Invalid {kind} key: expected {expected} bytes, got {actual}")]
    InvalidKey {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A sealed session key was too short to hold its envelope
    #[error("Sealed session key of {length} bytes is too short, at least {minimum} bytes are required")]
    SealedKeyTooShort { length: usize, minimum: usize },

    /// Authenticated encryption failed
    #[error("Failed to encrypt {length} bytes")]
    EncryptFailed { length: usize },

    /// Authenticated decryption failed: wrong key, tampered or truncated data
    #[error("Failed to decrypt {length} bytes: wrong key or corrupted ciphertext")]
    DecryptFailed { length: usize },

    /// The system random number generator was unavailable
    #[error("System random number generator is unavailable")]
    RandomUnavailable,
}
