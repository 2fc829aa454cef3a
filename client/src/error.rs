use thiserror::Error;

use rally_shared::{
    handshake::CryptoError, transport::TransportError, DispatchError, FrameError,
};

use crate::ConnectionState;

/// Failures while negotiating the session key with the server
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    #[error("Received {message} while in state {state:?}")]
    UnexpectedMessage {
        message: &'static str,
        state: ConnectionState,
    },

    #[error("Server offered peer id 0, which is reserved for the server")]
    ReservedPeerId,

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Every error the client reports, either returned from a call or
/// delivered through [`ErrorEvent`](crate::ErrorEvent)
#[derive(Debug, Error)]
pub enum RallyClientError {
    #[error("Client is not connected, call connect() first")]
    NotConnected,

    #[error("Client is already connected or connecting")]
    AlreadyConnected,

    #[error("Operation requires a completed handshake, current state is {state:?}")]
    HandshakeIncomplete { state: ConnectionState },

    /// The server broke the protocol and the connection was closed
    #[error("Protocol violation by the server: {reason}")]
    ProtocolViolation { reason: String },

    #[error("Not a member of group '{name}'")]
    NotAMember { name: String },

    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
