use thiserror::Error;

use rally_shared::{GroupId, PeerId};

/// Reasons a join did not happen. The registries are left unchanged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("{peer} is not registered")]
    UnknownPeer { peer: PeerId },

    #[error("{peer} is already a member of group '{name}'")]
    AlreadyMember { peer: PeerId, name: String },

    /// The group accepted the member but the peer's own table refused it
    #[error("Failed to record group '{name}' in the membership table of {peer}")]
    PeerTableInsertFailed { peer: PeerId, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaveError {
    #[error("{peer} is not registered")]
    UnknownPeer { peer: PeerId },

    #[error("Group '{name}' does not exist")]
    UnknownGroup { name: String },

    #[error("{peer} is not a member of group '{name}'")]
    NotAMember { peer: PeerId, name: String },
}

/// Reasons a fan-out could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("{group} does not exist")]
    UnknownGroup { group: GroupId },

    /// Group-scoped targets need the sender to be in at least one group
    #[error("{sender} belongs to no group, group-scoped targets have no recipients")]
    NoGroups { sender: PeerId },

    /// Sending into a group the sender is not a member of
    #[error("{sender} is not a member of {group} and cross-group sends are disabled")]
    NotAMember { sender: PeerId, group: GroupId },
}
