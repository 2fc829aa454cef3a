use thiserror::Error;

use rally_shared::{
    handshake::CryptoError, transport::TransportError, DispatchError, FrameError, PeerId,
};

use crate::{
    cache::CacheError,
    group::{JoinError, LeaveError, TargetError},
    peer::PeerError,
    route_table::RouteError,
    router::RouterError,
};

/// Every error the server reports, either returned from a call or
/// delivered through [`ErrorEvent`](crate::ErrorEvent)
#[derive(Debug, Error)]
pub enum RallyServerError {
    #[error("Server is not listening, call listen() first")]
    NotListening,

    /// A peer broke the protocol and was disconnected
    #[error("Protocol violation by {peer}: {reason}")]
    ProtocolViolation { peer: PeerId, reason: String },

    #[error(transparent)]
    Peer(#[from] PeerError),

    #[error(transparent)]
    Join(#[from] JoinError),

    #[error(transparent)]
    Leave(#[from] LeaveError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Router(#[from] RouterError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
