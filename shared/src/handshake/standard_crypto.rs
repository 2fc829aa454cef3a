use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};

use super::{CryptoError, HandshakeCrypto, KeyPair, SessionKey, NONCE_LEN, SESSION_KEY_LEN};

const X25519_KEY_LEN: usize = 32;
const AES_GCM_TAG_LEN: usize = 16;

/// X25519 + AES-256-GCM handshake crypto.
///
/// A sealed session key is `ephemeral public key || nonce || ciphertext`,
/// encrypted with SHA-256(shared secret || ephemeral public || recipient public).
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardCrypto;

impl StandardCrypto {
    pub fn new() -> Self {
        Self
    }

    fn random_nonce() -> Result<[u8; NONCE_LEN], CryptoError> {
        let mut nonce = [0; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|_| CryptoError::RandomUnavailable)?;
        Ok(nonce)
    }

    fn x25519_bytes(kind: &'static str, bytes: &[u8]) -> Result<[u8; X25519_KEY_LEN], CryptoError> {
        bytes.try_into().map_err(|_| CryptoError::InvalidKey {
            kind,
            expected: X25519_KEY_LEN,
            actual: bytes.len(),
        })
    }

    fn envelope_key(shared: &[u8], ephemeral: &PublicKey, recipient: &PublicKey) -> SessionKey {
        let mut hasher = Sha256::new();
        hasher.update(shared);
        hasher.update(ephemeral.as_bytes());
        hasher.update(recipient.as_bytes());
        let digest = hasher.finalize();
        let mut key = [0; SESSION_KEY_LEN];
        key.copy_from_slice(&digest);
        SessionKey::new(key)
    }

    fn cipher(key: &SessionKey) -> Result<Aes256Gcm, CryptoError> {
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::InvalidKey {
            kind: "session",
            expected: SESSION_KEY_LEN,
            actual: key.as_bytes().len(),
        })
    }
}

impl HandshakeCrypto for StandardCrypto {
    fn generate_key_pair(&self) -> Result<KeyPair, CryptoError> {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Ok(KeyPair::new(
            public.as_bytes().to_vec(),
            secret.to_bytes().to_vec(),
        ))
    }

    fn generate_session_key(&self) -> Result<SessionKey, CryptoError> {
        let mut key = [0; SESSION_KEY_LEN];
        OsRng
            .try_fill_bytes(&mut key)
            .map_err(|_| CryptoError::RandomUnavailable)?;
        Ok(SessionKey::new(key))
    }

    fn seal_session_key(
        &self,
        public_key: &[u8],
        session_key: &SessionKey,
    ) -> Result<Vec<u8>, CryptoError> {
        let recipient = PublicKey::from(Self::x25519_bytes("public", public_key)?);
        let ephemeral_secret = EphemeralSecret::random_from_rng(OsRng);
        let ephemeral = PublicKey::from(&ephemeral_secret);
        let shared = ephemeral_secret.diffie_hellman(&recipient);
        let envelope = Self::envelope_key(shared.as_bytes(), &ephemeral, &recipient);

        let (ciphertext, nonce) = self.encrypt(&envelope, session_key.as_bytes())?;
        let mut sealed = Vec::with_capacity(X25519_KEY_LEN + NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(ephemeral.as_bytes());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn open_session_key(
        &self,
        key_pair: &KeyPair,
        sealed: &[u8],
    ) -> Result<SessionKey, CryptoError> {
        let minimum = X25519_KEY_LEN + NONCE_LEN + AES_GCM_TAG_LEN;
        if sealed.len() < minimum {
            return Err(CryptoError::SealedKeyTooShort {
                length: sealed.len(),
                minimum,
            });
        }
        let secret = StaticSecret::from(Self::x25519_bytes("secret", key_pair.secret_key())?);
        let recipient = PublicKey::from(&secret);
        let ephemeral = PublicKey::from(Self::x25519_bytes("public", &sealed[..X25519_KEY_LEN])?);
        let mut nonce = [0; NONCE_LEN];
        nonce.copy_from_slice(&sealed[X25519_KEY_LEN..X25519_KEY_LEN + NONCE_LEN]);

        let shared = secret.diffie_hellman(&ephemeral);
        let envelope = Self::envelope_key(shared.as_bytes(), &ephemeral, &recipient);
        let plaintext = self.decrypt(&envelope, &sealed[X25519_KEY_LEN + NONCE_LEN..], &nonce)?;
        SessionKey::from_slice(&plaintext)
    }

    fn encrypt(
        &self,
        key: &SessionKey,
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, [u8; NONCE_LEN]), CryptoError> {
        let nonce = Self::random_nonce()?;
        let ciphertext = Self::cipher(key)?
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| CryptoError::EncryptFailed {
                length: plaintext.len(),
            })?;
        Ok((ciphertext, nonce))
    }

    fn decrypt(
        &self,
        key: &SessionKey,
        ciphertext: &[u8],
        nonce: &[u8; NONCE_LEN],
    ) -> Result<Vec<u8>, CryptoError> {
        Self::cipher(key)?
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::DecryptFailed {
                length: ciphertext.len(),
            })
    }
}
