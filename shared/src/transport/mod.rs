use std::net::SocketAddr;

use crate::{DeliveryMode, SequenceChannel};

mod channel;
mod error;

pub use channel::{IncomingSender, PacketChannel};
pub use error::TransportError;

/// What a transport reports to the session on its main thread
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// A remote endpoint opened a connection
    Connected(SocketAddr),
    /// A remote endpoint went away
    Disconnected(SocketAddr),
    Packet {
        addr: SocketAddr,
        payload: Box<[u8]>,
        delivery: DeliveryMode,
        channel: SequenceChannel,
    },
}

/// Outbound half of a transport
pub trait PacketSender: Send + Sync {
    /// Hands `payload` to the transport for delivery to `addr`. Fire-and-forget
    fn send(
        &self,
        addr: &SocketAddr,
        payload: &[u8],
        delivery: DeliveryMode,
        channel: SequenceChannel,
    ) -> Result<(), TransportError>;

    /// Closes the connection to `addr`
    fn disconnect(&self, addr: &SocketAddr) -> Result<(), TransportError>;
}

/// Inbound half of a transport, drained on the main thread
pub trait PacketReceiver: Send {
    /// Returns the next pending event, or `None` when the queue is empty
    fn receive(&mut self) -> Result<Option<TransportEvent>, TransportError>;
}

/// A listening transport, consumed when the server starts
pub trait ServerSocket {
    fn listen(self: Box<Self>) -> (Box<dyn PacketSender>, Box<dyn PacketReceiver>);
}

/// A connecting transport, consumed when the client connects
pub trait ClientSocket {
    fn connect(
        self: Box<Self>,
        server_addr: SocketAddr,
    ) -> (Box<dyn PacketSender>, Box<dyn PacketReceiver>);
}
