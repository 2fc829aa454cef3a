use crate::{CacheMode, DeliveryMode, GroupId, SequenceChannel, Target};

/// Routing, delivery and caching parameters of one send
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SendOptions {
    pub target: Target,
    pub delivery: DeliveryMode,
    pub channel: SequenceChannel,
    pub group_id: GroupId,
    pub cache_id: u32,
    pub cache_mode: CacheMode,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            target: Target::All,
            delivery: DeliveryMode::ReliableOrdered,
            channel: 0,
            group_id: GroupId::NONE,
            cache_id: 0,
            cache_mode: CacheMode::empty(),
        }
    }
}

impl SendOptions {
    pub fn to(target: Target) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn delivery(mut self, delivery: DeliveryMode) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn channel(mut self, channel: SequenceChannel) -> Self {
        self.channel = channel;
        self
    }

    pub fn group(mut self, group_id: GroupId) -> Self {
        self.group_id = group_id;
        self
    }

    pub fn cached(mut self, cache_id: u32, cache_mode: CacheMode) -> Self {
        self.cache_id = cache_id;
        self.cache_mode = cache_mode;
        self
    }

    pub fn is_cached(&self) -> bool {
        self.cache_id != 0 || !self.cache_mode.is_empty()
    }
}
