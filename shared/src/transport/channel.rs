use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};

use super::{PacketReceiver, TransportError, TransportEvent};

/// Hands transport events from I/O threads to the session's main thread
pub struct PacketChannel;

impl PacketChannel {
    pub fn unbounded() -> (IncomingSender, Box<dyn PacketReceiver>) {
        let (sender, receiver) = unbounded();
        (
            IncomingSender { sender },
            Box::new(PacketChannelReceiver { receiver }),
        )
    }
}

/// The I/O-thread end of a [`PacketChannel`]
#[derive(Clone)]
pub struct IncomingSender {
    sender: Sender<TransportEvent>,
}

impl IncomingSender {
    pub fn push(&self, event: TransportEvent) -> Result<(), TransportError> {
        self.sender
            .send(event)
            .map_err(|_| TransportError::ChannelClosed)
    }
}

struct PacketChannelReceiver {
    receiver: Receiver<TransportEvent>,
}

impl PacketReceiver for PacketChannelReceiver {
    fn receive(&mut self) -> Result<Option<TransportEvent>, TransportError> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::ChannelClosed),
        }
    }
}
