use std::{
    collections::{HashMap, HashSet},
    net::SocketAddr,
};

use rally_shared::{handshake::SessionKey, GroupId, PeerId};

/// Where a connection stands in the bootstrap
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerState {
    /// The public key offer went out, waiting for the sealed session key
    HandshakeBegin,
    /// The session key is stored and `EndHandshake` went out, waiting for the acknowledgement
    HandshakeEnd,
    /// Handshake complete, ordinary traffic allowed
    Connected,
}

/// One remote connection
#[derive(Debug)]
pub struct Peer {
    id: PeerId,
    addr: SocketAddr,
    state: PeerState,
    session_key: Option<SessionKey>,
    groups: HashSet<GroupId>,
    data: HashMap<String, Vec<u8>>,
}

impl Peer {
    pub(crate) fn new(id: PeerId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            state: PeerState::HandshakeBegin,
            session_key: None,
            groups: HashSet::new(),
            data: HashMap::new(),
        }
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn state(&self) -> PeerState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: PeerState) {
        self.state = state;
    }

    /// Whether the handshake completed and routed traffic may reach this peer
    pub fn is_connected(&self) -> bool {
        self.state == PeerState::Connected
    }

    pub fn session_key(&self) -> Option<&SessionKey> {
        self.session_key.as_ref()
    }

    pub(crate) fn replace_session_key(&mut self, key: SessionKey) -> Option<SessionKey> {
        self.session_key.replace(key)
    }

    pub fn groups(&self) -> impl Iterator<Item = &GroupId> {
        self.groups.iter()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_in_group(&self, group_id: &GroupId) -> bool {
        self.groups.contains(group_id)
    }

    pub(crate) fn insert_group(&mut self, group_id: GroupId) -> bool {
        self.groups.insert(group_id)
    }

    pub(crate) fn remove_group(&mut self, group_id: &GroupId) -> bool {
        self.groups.remove(group_id)
    }

    // Data store

    pub fn data(&self, key: &str) -> Option<&[u8]> {
        self.data.get(key).map(Vec::as_slice)
    }

    pub fn set_data(&mut self, key: impl Into<String>, value: Vec<u8>) -> Option<Vec<u8>> {
        self.data.insert(key.into(), value)
    }

    pub fn remove_data(&mut self, key: &str) -> Option<Vec<u8>> {
        self.data.remove(key)
    }

    pub(crate) fn clear_data(&mut self) {
        self.data.clear();
    }
}
