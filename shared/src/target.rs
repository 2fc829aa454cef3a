use rally_serde::{Serde, SerdeErr, WireBuffer};

/// Who receives a routed frame, seen from the sending peer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Target {
    /// Only the sender
    OnlySelf,
    /// Every connected peer
    #[default]
    All,
    /// Every connected peer but the sender
    AllExceptSelf,
    /// Members of the sender's groups
    GroupMembers,
    /// Members of the sender's groups, without the sender
    GroupMembersExceptSelf,
    /// Peers that belong to no group at all
    NonGroupMembers,
    /// Handled by the server, never relayed
    Server,
}

impl Target {
    pub fn is_group_scoped(&self) -> bool {
        matches!(self, Target::GroupMembers | Target::GroupMembersExceptSelf)
    }

    pub fn excludes_sender(&self) -> bool {
        matches!(self, Target::AllExceptSelf | Target::GroupMembersExceptSelf)
    }

    fn to_byte(self) -> u8 {
        match self {
            Target::OnlySelf => 0,
            Target::All => 1,
            Target::AllExceptSelf => 2,
            Target::GroupMembers => 3,
            Target::GroupMembersExceptSelf => 4,
            Target::NonGroupMembers => 5,
            Target::Server => 6,
        }
    }
}

impl Serde for Target {
    fn ser(&self, writer: &mut WireBuffer) -> Result<(), SerdeErr> {
        writer.write_u8(self.to_byte())
    }

    fn de(reader: &mut WireBuffer) -> Result<Self, SerdeErr> {
        match reader.read_u8()? {
            0 => Ok(Target::OnlySelf),
            1 => Ok(Target::All),
            2 => Ok(Target::AllExceptSelf),
            3 => Ok(Target::GroupMembers),
            4 => Ok(Target::GroupMembersExceptSelf),
            5 => Ok(Target::NonGroupMembers),
            6 => Ok(Target::Server),
            tag => Err(SerdeErr::UnknownTag {
                tag,
                type_name: "Target",
            }),
        }
    }
}
