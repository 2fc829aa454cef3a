use std::{mem, net::SocketAddr, vec::IntoIter};

use rally_shared::{GroupId, PeerId};

use crate::RallyClientError;

/// The server confirmed a group join
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupJoin {
    pub group_id: GroupId,
    pub name: String,
}

/// The server confirmed a group leave, or removed the client from a group
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupLeave {
    pub group_id: GroupId,
    pub name: String,
    pub reason: String,
}

/// An application-defined message relayed by the server
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomMessage {
    pub sender: PeerId,
    pub kind: u8,
    pub payload: Vec<u8>,
}

pub struct Events {
    connections: Vec<PeerId>,
    disconnections: Vec<SocketAddr>,
    joins: Vec<GroupJoin>,
    leaves: Vec<GroupLeave>,
    customs: Vec<CustomMessage>,
    errors: Vec<RallyClientError>,

    empty: bool,
}

impl Events {
    pub(crate) fn new() -> Self {
        Self {
            connections: Vec::new(),
            disconnections: Vec::new(),
            joins: Vec::new(),
            leaves: Vec::new(),
            customs: Vec::new(),
            errors: Vec::new(),

            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: Event>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: Event>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_connection(&mut self, peer: PeerId) {
        self.connections.push(peer);
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self, addr: SocketAddr) {
        self.disconnections.push(addr);
        self.empty = false;
    }

    pub(crate) fn push_join(&mut self, join: GroupJoin) {
        self.joins.push(join);
        self.empty = false;
    }

    pub(crate) fn push_leave(&mut self, leave: GroupLeave) {
        self.leaves.push(leave);
        self.empty = false;
    }

    pub(crate) fn push_custom(&mut self, message: CustomMessage) {
        self.customs.push(message);
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: RallyClientError) {
        self.errors.push(error);
        self.empty = false;
    }
}

// Event Trait
pub trait Event {
    type Iter;

    fn iter(events: &mut Events) -> Self::Iter;

    fn has(events: &Events) -> bool;
}

// ConnectEvent
pub struct ConnectEvent;
impl Event for ConnectEvent {
    type Iter = IntoIter<PeerId>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.connections).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.connections.is_empty()
    }
}

// DisconnectEvent
pub struct DisconnectEvent;
impl Event for DisconnectEvent {
    type Iter = IntoIter<SocketAddr>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.disconnections).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.disconnections.is_empty()
    }
}

// GroupJoinEvent
pub struct GroupJoinEvent;
impl Event for GroupJoinEvent {
    type Iter = IntoIter<GroupJoin>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.joins).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.joins.is_empty()
    }
}

// GroupLeaveEvent
pub struct GroupLeaveEvent;
impl Event for GroupLeaveEvent {
    type Iter = IntoIter<GroupLeave>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.leaves).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.leaves.is_empty()
    }
}

// CustomMessageEvent
pub struct CustomMessageEvent;
impl Event for CustomMessageEvent {
    type Iter = IntoIter<CustomMessage>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.customs).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.customs.is_empty()
    }
}

// ErrorEvent
pub struct ErrorEvent;
impl Event for ErrorEvent {
    type Iter = IntoIter<RallyClientError>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.errors).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.errors.is_empty()
    }
}
