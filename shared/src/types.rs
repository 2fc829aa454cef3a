use std::{fmt, hash::Hasher};

use twox_hash::XxHash32;

pub type IdentityId = i32;
pub type InstanceId = u8;
pub type MethodId = u8;
pub type SequenceChannel = u8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostType {
    Server,
    Client,
}

impl HostType {
    pub fn invert(self) -> Self {
        match self {
            HostType::Server => HostType::Client,
            HostType::Client => HostType::Server,
        }
    }
}

// PeerId

/// Numeric identity of one connection. `0` is reserved for the server's own
/// pseudo-peer and is never handed to a remote connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PeerId(u32);

impl PeerId {
    pub const SERVER: PeerId = PeerId(0);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn get(&self) -> u32 {
        self.0
    }

    pub const fn is_server(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}

// GroupId

/// Numeric identity of a group, derived from its name.
/// `0` means "no group".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GroupId(u32);

impl GroupId {
    pub const NONE: GroupId = GroupId(0);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// xxHash32 of the UTF-8 name. Distinct names may collide; a hash of 0
    /// is moved to 1 so that it never aliases [`GroupId::NONE`].
    pub fn from_name(name: &str) -> Self {
        let mut hasher = XxHash32::with_seed(0);
        hasher.write(name.as_bytes());
        let hash = hasher.finish() as u32;
        Self(hash.max(1))
    }

    pub const fn get(&self) -> u32 {
        self.0
    }

    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{:08x}", self.0)
    }
}
