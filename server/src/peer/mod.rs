mod error;
mod peer;
mod peer_registry;

pub use error::PeerError;
pub use peer::{Peer, PeerState};
pub use peer_registry::PeerRegistry;
