use crate::{
    handshake::{HandshakeCrypto, SessionKey, NONCE_LEN},
    MessageType,
};

use super::FrameError;

/// Encrypts everything after the message-type byte with the peer's session
/// key. Handshake frames travel in the clear
pub fn seal_frame(
    crypto: &dyn HandshakeCrypto,
    key: &SessionKey,
    frame: &[u8],
) -> Result<Vec<u8>, FrameError> {
    let Some((&kind, body)) = frame.split_first() else {
        return Err(FrameError::Empty);
    };
    if MessageType::from_byte(kind).is_handshake() {
        return Ok(frame.to_vec());
    }
    let (ciphertext, nonce) = crypto.encrypt(key, body)?;
    let mut sealed = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
    sealed.push(kind);
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Reverses [`seal_frame`]
pub fn open_frame(
    crypto: &dyn HandshakeCrypto,
    key: &SessionKey,
    sealed: &[u8],
) -> Result<Vec<u8>, FrameError> {
    let Some((&kind, body)) = sealed.split_first() else {
        return Err(FrameError::Empty);
    };
    if MessageType::from_byte(kind).is_handshake() {
        return Ok(sealed.to_vec());
    }
    if body.len() < NONCE_LEN {
        return Err(FrameError::TooShort {
            length: sealed.len(),
            minimum: 1 + NONCE_LEN,
        });
    }
    let mut nonce = [0; NONCE_LEN];
    nonce.copy_from_slice(&body[..NONCE_LEN]);
    let plaintext = crypto.decrypt(key, &body[NONCE_LEN..], &nonce)?;
    let mut frame = Vec::with_capacity(1 + plaintext.len());
    frame.push(kind);
    frame.extend_from_slice(&plaintext);
    Ok(frame)
}
