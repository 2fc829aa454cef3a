use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur while handing packets to or from a transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The transport refused or failed to send a packet
    #[error("Failed to send {length} bytes to {addr}")]
    SendFailed { addr: SocketAddr, length: usize },

    /// The address has no open connection on this transport
    #[error("No connection is open to {addr}")]
    UnknownAddress { addr: SocketAddr },

    /// The other end of the I/O hand-off channel is gone
    #[error("Transport channel is closed")]
    ChannelClosed,
}
