use std::collections::{BTreeSet, HashMap};

use log::{info, warn};

use rally_shared::{GroupId, PeerId, RouterConfig, SendOptions, Target};

use super::{Group, JoinError, LeaveError, TargetError};
use crate::peer::PeerRegistry;

/// Result of a successful leave
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Departure {
    pub group_id: GroupId,
    pub name: String,
    /// The group emptied and was removed from the registry
    pub destroyed: bool,
}

/// All groups, plus the group side of peer membership.
///
/// A peer is in a group's member table iff the group is in the peer's
/// membership table. Every mutation keeps both sides in step.
#[derive(Default)]
pub struct GroupRegistry {
    groups: HashMap<GroupId, Group>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, group_id: &GroupId) -> Option<&Group> {
        self.groups.get(group_id)
    }

    pub fn get_mut(&mut self, group_id: &GroupId) -> Option<&mut Group> {
        self.groups.get_mut(group_id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Group> {
        self.groups.get(&GroupId::from_name(name))
    }

    pub fn contains(&self, group_id: &GroupId) -> bool {
        self.groups.contains_key(group_id)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Creates the group if it does not exist yet
    pub fn create(&mut self, name: &str, destroy_when_empty: bool) -> GroupId {
        let group_id = GroupId::from_name(name);
        match self.groups.get(&group_id) {
            Some(existing) => warn_on_collision(existing, name),
            None => {
                info!("created group '{}' ({})", name, group_id);
                self.groups
                    .insert(group_id, Group::new(name, destroy_when_empty));
            }
        }
        group_id
    }

    /// Adds `peer` to the group called `name`, creating the group first if
    /// needed. Either both membership tables change or neither does
    pub fn join(
        &mut self,
        peers: &mut PeerRegistry,
        peer: PeerId,
        name: &str,
        destroy_when_empty: bool,
    ) -> Result<GroupId, JoinError> {
        if !peers.contains(&peer) {
            return Err(JoinError::UnknownPeer { peer });
        }
        let group_id = GroupId::from_name(name);
        let created = !self.groups.contains_key(&group_id);
        let group_id = self.create(name, destroy_when_empty);
        let Some(group) = self.groups.get_mut(&group_id) else {
            return Err(JoinError::PeerTableInsertFailed {
                peer,
                name: name.to_owned(),
            });
        };

        if !group.insert_member(peer) {
            return Err(JoinError::AlreadyMember {
                peer,
                name: name.to_owned(),
            });
        }
        let recorded = peers
            .get_mut(&peer)
            .map(|record| record.insert_group(group_id))
            .unwrap_or(false);
        if !recorded {
            group.remove_member(&peer);
            if created {
                self.groups.remove(&group_id);
            }
            return Err(JoinError::PeerTableInsertFailed {
                peer,
                name: name.to_owned(),
            });
        }
        info!("{} joined group '{}'", peer, name);
        Ok(group_id)
    }

    /// Removes `peer` from the group called `name`. An emptied group is
    /// destroyed when its destroy-when-empty flag is set
    pub fn leave(
        &mut self,
        peers: &mut PeerRegistry,
        peer: PeerId,
        name: &str,
    ) -> Result<Departure, LeaveError> {
        self.leave_by_id(peers, peer, GroupId::from_name(name), name)
    }

    /// Removes `peer` from every group it belongs to
    pub fn leave_all(&mut self, peers: &mut PeerRegistry, peer: PeerId) -> Vec<Departure> {
        let Some(record) = peers.get(&peer) else {
            return Vec::new();
        };
        let mut group_ids: Vec<GroupId> = record.groups().copied().collect();
        group_ids.sort();

        let mut departures = Vec::with_capacity(group_ids.len());
        for group_id in group_ids {
            let name = self
                .groups
                .get(&group_id)
                .map(|group| group.name().to_owned())
                .unwrap_or_default();
            match self.leave_by_id(peers, peer, group_id, &name) {
                Ok(departure) => departures.push(departure),
                Err(error) => {
                    // stale membership on the peer side, drop it
                    warn!("{}", error);
                    if let Some(record) = peers.get_mut(&peer) {
                        record.remove_group(&group_id);
                    }
                }
            }
        }
        departures
    }

    /// Removes the group regardless of its members, who are evicted first
    pub fn destroy(&mut self, peers: &mut PeerRegistry, group_id: &GroupId) -> Option<Group> {
        let mut group = self.groups.remove(group_id)?;
        for member in group.take_members() {
            if let Some(record) = peers.get_mut(&member) {
                record.remove_group(group_id);
            }
        }
        info!("destroyed group '{}'", group.name());
        Some(group)
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    /// Computes the recipients of a frame sent by `sender` with `options`.
    ///
    /// Only peers that completed the handshake are returned. The server
    /// pseudo-peer never receives its own broadcasts.
    pub fn resolve_targets(
        &self,
        peers: &PeerRegistry,
        sender: PeerId,
        options: &SendOptions,
        config: &RouterConfig,
    ) -> Result<Vec<PeerId>, TargetError> {
        let connected = |id: &PeerId| peers.get(id).map(|peer| peer.is_connected()).unwrap_or(false);

        let recipients: BTreeSet<PeerId> = match options.target {
            Target::Server => BTreeSet::new(),
            Target::OnlySelf => [sender].into_iter().filter(connected).collect(),
            Target::All | Target::AllExceptSelf => peers
                .iter()
                .filter(|peer| peer.is_connected())
                .map(|peer| peer.id())
                .collect(),
            Target::NonGroupMembers => peers
                .iter()
                .filter(|peer| peer.is_connected() && peer.group_count() == 0)
                .map(|peer| peer.id())
                .collect(),
            Target::GroupMembers | Target::GroupMembersExceptSelf => {
                let mut members = BTreeSet::new();
                for group_id in self.scoped_groups(peers, sender, options.group_id, config)? {
                    if let Some(group) = self.groups.get(&group_id) {
                        members.extend(group.members().copied().filter(connected));
                    }
                }
                members
            }
        };

        Ok(recipients
            .into_iter()
            .filter(|id| !(options.target.excludes_sender() && *id == sender))
            .filter(|id| !id.is_server())
            .collect())
    }

    /// Whether `sender` may address `group_id` explicitly, either as a
    /// fan-out target or as a cache scope. The group must exist, and the
    /// sender must be the server, a member, or allowed to cross groups
    pub fn check_access(
        &self,
        sender: PeerId,
        group_id: GroupId,
        config: &RouterConfig,
    ) -> Result<(), TargetError> {
        let group = self
            .groups
            .get(&group_id)
            .ok_or(TargetError::UnknownGroup { group: group_id })?;
        if !sender.is_server() && !config.allow_cross_group && !group.has_member(&sender) {
            return Err(TargetError::NotAMember {
                sender,
                group: group_id,
            });
        }
        Ok(())
    }

    fn scoped_groups(
        &self,
        peers: &PeerRegistry,
        sender: PeerId,
        group_id: GroupId,
        config: &RouterConfig,
    ) -> Result<Vec<GroupId>, TargetError> {
        if !group_id.is_none() {
            self.check_access(sender, group_id, config)?;
            return Ok(vec![group_id]);
        }
        let groups: Vec<GroupId> = peers
            .get(&sender)
            .map(|peer| peer.groups().copied().collect())
            .unwrap_or_default();
        if groups.is_empty() {
            return Err(TargetError::NoGroups { sender });
        }
        Ok(groups)
    }

    fn leave_by_id(
        &mut self,
        peers: &mut PeerRegistry,
        peer: PeerId,
        group_id: GroupId,
        name: &str,
    ) -> Result<Departure, LeaveError> {
        if !peers.contains(&peer) {
            return Err(LeaveError::UnknownPeer { peer });
        }
        let group = self
            .groups
            .get_mut(&group_id)
            .ok_or_else(|| LeaveError::UnknownGroup {
                name: name.to_owned(),
            })?;
        if !group.remove_member(&peer) {
            return Err(LeaveError::NotAMember {
                peer,
                name: name.to_owned(),
            });
        }
        if let Some(record) = peers.get_mut(&peer) {
            let removed = record.remove_group(&group_id);
            debug_assert!(removed, "membership tables disagree for {}", peer);
        }
        let name = group.name().to_owned();
        let destroyed = group.is_empty() && group.destroy_when_empty();
        if destroyed {
            self.groups.remove(&group_id);
            info!("destroyed empty group '{}'", name);
        }
        info!("{} left group '{}'", peer, name);
        Ok(Departure {
            group_id,
            name,
            destroyed,
        })
    }
}

fn warn_on_collision(existing: &Group, name: &str) {
    if existing.name() != name {
        warn!(
            "group name '{}' hashes to {} which already belongs to '{}', the groups are merged",
            name,
            existing.id(),
            existing.name()
        );
    }
}
