use std::net::SocketAddr;

use thiserror::Error;

use rally_shared::PeerId;

/// Errors raised by the peer registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerError {
    /// A second connection claimed an endpoint that is already registered
    #[error("Endpoint {addr} is already registered as {peer}")]
    AddressInUse { addr: SocketAddr, peer: PeerId },

    #[error("{peer} is not registered")]
    UnknownPeer { peer: PeerId },

    /// Every non-zero peer id is taken
    #[error("No peer ids are left to assign")]
    IdsExhausted,
}
