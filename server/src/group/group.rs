use std::collections::HashSet;

use rally_shared::{GroupId, PeerId};

/// A named broadcast domain
#[derive(Debug)]
pub struct Group {
    id: GroupId,
    name: String,
    members: HashSet<PeerId>,
    destroy_when_empty: bool,
}

impl Group {
    pub(crate) fn new(name: &str, destroy_when_empty: bool) -> Self {
        Self {
            id: GroupId::from_name(name),
            name: name.to_owned(),
            members: HashSet::new(),
            destroy_when_empty,
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn destroy_when_empty(&self) -> bool {
        self.destroy_when_empty
    }

    pub fn set_destroy_when_empty(&mut self, destroy_when_empty: bool) {
        self.destroy_when_empty = destroy_when_empty;
    }

    pub fn has_member(&self, peer: &PeerId) -> bool {
        self.members.contains(peer)
    }

    pub fn members(&self) -> impl Iterator<Item = &PeerId> {
        self.members.iter()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn insert_member(&mut self, peer: PeerId) -> bool {
        self.members.insert(peer)
    }

    pub(crate) fn remove_member(&mut self, peer: &PeerId) -> bool {
        self.members.remove(peer)
    }

    pub(crate) fn take_members(&mut self) -> HashSet<PeerId> {
        std::mem::take(&mut self.members)
    }
}
