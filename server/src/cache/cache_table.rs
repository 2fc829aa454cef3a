use std::collections::BTreeMap;

use rally_shared::{CacheMode, PeerId};

use super::CachedMessage;

/// The two tables of one cache scope: an append list and an
/// overwrite map holding at most one entry per cache id
#[derive(Debug, Default)]
pub struct CacheTable {
    appended: Vec<CachedMessage>,
    overwritten: BTreeMap<u32, CachedMessage>,
}

impl CacheTable {
    pub(crate) fn store(&mut self, message: CachedMessage) {
        if message.mode.is_overwrite() {
            self.overwritten.insert(message.cache_id, message);
        } else {
            self.appended.push(message);
        }
    }

    pub fn len(&self) -> usize {
        self.appended.len() + self.overwritten.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries in replay order: appended entries as stored, then overwrite entries by id
    pub fn iter(&self) -> impl Iterator<Item = &CachedMessage> {
        self.appended.iter().chain(self.overwritten.values())
    }

    pub(crate) fn matching(
        &self,
        cache_id: u32,
        kind: CacheMode,
    ) -> impl Iterator<Item = &CachedMessage> {
        self.iter()
            .filter(move |message| message.cache_id == cache_id && message.kind() == kind)
    }

    pub(crate) fn remove(&mut self, cache_id: u32, kind: CacheMode) -> usize {
        let before = self.len();
        self.appended
            .retain(|message| !(message.cache_id == cache_id && message.kind() == kind));
        if kind.is_overwrite() {
            self.overwritten.remove(&cache_id);
        }
        before - self.len()
    }

    pub(crate) fn remove_auto_destroyed(&mut self, origin: PeerId) -> usize {
        let before = self.len();
        let doomed = |message: &CachedMessage| message.auto_destroys() && message.origin == origin;
        self.appended.retain(|message| !doomed(message));
        self.overwritten.retain(|_, message| !doomed(message));
        before - self.len()
    }
}
