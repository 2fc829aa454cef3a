use std::fmt;

use super::CryptoError;

/// Length of the nonce that prefixes every encrypted payload
pub const NONCE_LEN: usize = 12;
/// Length of a symmetric session key
pub const SESSION_KEY_LEN: usize = 32;

/// The per-connection symmetric key agreed on during the handshake
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey([u8; SESSION_KEY_LEN]);

impl SessionKey {
    pub fn new(bytes: [u8; SESSION_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; SESSION_KEY_LEN] =
            bytes.try_into().map_err(|_| CryptoError::InvalidKey {
                kind: "session",
                expected: SESSION_KEY_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

/// The server's asymmetric key pair. Only the public half is ever sent
#[derive(Clone)]
pub struct KeyPair {
    public: Vec<u8>,
    secret: Vec<u8>,
}

impl KeyPair {
    pub fn new(public: Vec<u8>, secret: Vec<u8>) -> Self {
        Self { public, secret }
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public
    }

    pub fn secret_key(&self) -> &[u8] {
        &self.secret
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// Cryptographic collaborator used by the connection bootstrap.
///
/// The server publishes the public half of a key pair, the client seals a
/// fresh session key against it, and both sides then encrypt payloads with
/// that session key.
pub trait HandshakeCrypto: Send + Sync {
    fn generate_key_pair(&self) -> Result<KeyPair, CryptoError>;

    fn generate_session_key(&self) -> Result<SessionKey, CryptoError>;

    /// Seals `session_key` so only the holder of `public_key`'s secret can open it
    fn seal_session_key(
        &self,
        public_key: &[u8],
        session_key: &SessionKey,
    ) -> Result<Vec<u8>, CryptoError>;

    fn open_session_key(&self, key_pair: &KeyPair, sealed: &[u8])
        -> Result<SessionKey, CryptoError>;

    /// Returns the ciphertext and the nonce it was sealed with
    fn encrypt(
        &self,
        key: &SessionKey,
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, [u8; NONCE_LEN]), CryptoError>;

    fn decrypt(
        &self,
        key: &SessionKey,
        ciphertext: &[u8],
        nonce: &[u8; NONCE_LEN],
    ) -> Result<Vec<u8>, CryptoError>;
}
