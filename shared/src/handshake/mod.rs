mod crypto;
mod error;

pub use crypto::{HandshakeCrypto, KeyPair, SessionKey, NONCE_LEN, SESSION_KEY_LEN};
pub use error::CryptoError;

cfg_if! {
    if #[cfg(feature = "standard_crypto")] {
        mod standard_crypto;
        pub use standard_crypto::StandardCrypto;
    }
}
