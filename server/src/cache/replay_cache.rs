use std::collections::HashMap;

use log::{debug, error};

use rally_shared::{CacheMode, GroupId, PeerId};

use super::{CacheError, CacheTable, CachedMessage};

/// Where a replay looks for entries
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheScope {
    Global,
    Group(GroupId),
}

/// Messages retained for late joiners, one table for the global scope and
/// one per group
#[derive(Default)]
pub struct ReplayCache {
    global: CacheTable,
    groups: HashMap<GroupId, CacheTable>,
}

impl ReplayCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `message` according to its mode. New-mode entries accumulate,
    /// overwrite-mode entries replace the previous entry with the same id
    pub fn store(&mut self, message: CachedMessage) -> Result<(), CacheError> {
        if let Err(invalid) = message.mode.validate(message.cache_id) {
            error!("refusing to cache: {}", invalid);
            return Err(invalid.into());
        }
        if message.cache_id == 0 {
            return Ok(());
        }
        if message.mode.is_group_scoped() {
            if message.group_id.is_none() {
                let error = CacheError::GroupRequired {
                    cache_id: message.cache_id,
                };
                error!("refusing to cache: {}", error);
                return Err(error);
            }
            debug!(
                "caching id {} for {} ({:?})",
                message.cache_id, message.group_id, message.mode
            );
            self.groups
                .entry(message.group_id)
                .or_default()
                .store(message);
        } else {
            debug!("caching id {} globally ({:?})", message.cache_id, message.mode);
            self.global.store(message);
        }
        Ok(())
    }

    pub fn table(&self, scope: CacheScope) -> Option<&CacheTable> {
        match scope {
            CacheScope::Global => Some(&self.global),
            CacheScope::Group(group_id) => self.groups.get(&group_id),
        }
    }

    /// Entries stored under `cache_id` with the policy and scope of `mode`
    /// that should be re-sent to `peer`. The peer's own entries are skipped
    /// unless `include_own`
    pub fn replay(
        &self,
        peer: PeerId,
        cache_id: u32,
        mode: CacheMode,
        group_id: GroupId,
        include_own: bool,
    ) -> Vec<&CachedMessage> {
        let kind = mode.difference(CacheMode::AUTO_DESTROY);
        let scope = if mode.is_group_scoped() {
            CacheScope::Group(group_id)
        } else {
            CacheScope::Global
        };
        let Some(table) = self.table(scope) else {
            return Vec::new();
        };
        table
            .matching(cache_id, kind)
            .filter(|message| include_own || message.origin != peer)
            .collect()
    }

    /// Every entry of a scope that should be re-sent to `peer`
    pub fn replay_all(&self, peer: PeerId, scope: CacheScope, include_own: bool) -> Vec<&CachedMessage> {
        let Some(table) = self.table(scope) else {
            return Vec::new();
        };
        table
            .iter()
            .filter(|message| include_own || message.origin != peer)
            .collect()
    }

    /// Explicitly deletes the entries stored under `cache_id` and `mode`
    pub fn remove(&mut self, cache_id: u32, mode: CacheMode, group_id: GroupId) -> usize {
        let kind = mode.difference(CacheMode::AUTO_DESTROY);
        if mode.is_group_scoped() {
            self.groups
                .get_mut(&group_id)
                .map(|table| table.remove(cache_id, kind))
                .unwrap_or(0)
        } else {
            self.global.remove(cache_id, kind)
        }
    }

    /// Drops every auto-destroy entry sent by `peer`, in every scope
    pub fn destroy_for_peer(&mut self, peer: PeerId) -> usize {
        let mut removed = self.global.remove_auto_destroyed(peer);
        for table in self.groups.values_mut() {
            removed += table.remove_auto_destroyed(peer);
        }
        if removed > 0 {
            debug!("dropped {} cached messages of {}", removed, peer);
        }
        removed
    }

    /// Clears both tables of a group
    pub fn destroy_for_group(&mut self, group_id: GroupId) -> bool {
        self.groups.remove(&group_id).is_some()
    }

    pub fn clear(&mut self) {
        self.global = CacheTable::default();
        self.groups.clear();
    }
}
