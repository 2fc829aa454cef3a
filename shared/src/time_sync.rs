use crate::PeerId;

/// Collaborator that answers `NtpQuery` frames
pub trait TimeSync: Send {
    /// Returns the reply body to send back to `from`, if any
    fn handle(&mut self, from: PeerId, body: &[u8]) -> Option<Vec<u8>>;
}
