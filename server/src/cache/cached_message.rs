use rally_shared::{CacheMode, DeliveryMode, GroupId, PeerId, SequenceChannel, Target};

/// A sent frame retained for replay
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedMessage {
    pub cache_id: u32,
    pub mode: CacheMode,
    /// The unencrypted frame bytes, re-encrypted per recipient on replay
    pub frame: Vec<u8>,
    pub origin: PeerId,
    pub delivery: DeliveryMode,
    pub target: Target,
    pub channel: SequenceChannel,
    pub group_id: GroupId,
}

impl CachedMessage {
    pub fn auto_destroys(&self) -> bool {
        self.mode.auto_destroys()
    }

    /// Policy and scope bits, ignoring AUTO_DESTROY
    pub(crate) fn kind(&self) -> CacheMode {
        self.mode.difference(CacheMode::AUTO_DESTROY)
    }
}
