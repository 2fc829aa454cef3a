use rally_serde::{Serde, SerdeErr, WireBuffer};

/// The first byte of every frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageType {
    NtpQuery,
    BeginHandshake,
    EndHandshake,
    LocalInvoke,
    GlobalInvoke,
    LeaveGroup,
    JoinGroup,
    Request,
    Response,
    /// Application-defined message, relayed like an invoke
    Custom(u8),
}

impl MessageType {
    pub const FIRST_CUSTOM: u8 = 9;

    pub fn is_handshake(&self) -> bool {
        matches!(self, MessageType::BeginHandshake | MessageType::EndHandshake)
    }

    /// Frames that carry a route header and may be fanned out to other peers
    pub fn is_relayable(&self) -> bool {
        matches!(
            self,
            MessageType::LocalInvoke | MessageType::GlobalInvoke | MessageType::Custom(_)
        )
    }

    pub fn to_byte(self) -> u8 {
        match self {
            MessageType::NtpQuery => 0,
            MessageType::BeginHandshake => 1,
            MessageType::EndHandshake => 2,
            MessageType::LocalInvoke => 3,
            MessageType::GlobalInvoke => 4,
            MessageType::LeaveGroup => 5,
            MessageType::JoinGroup => 6,
            MessageType::Request => 7,
            MessageType::Response => 8,
            MessageType::Custom(kind) => kind,
        }
    }

    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => MessageType::NtpQuery,
            1 => MessageType::BeginHandshake,
            2 => MessageType::EndHandshake,
            3 => MessageType::LocalInvoke,
            4 => MessageType::GlobalInvoke,
            5 => MessageType::LeaveGroup,
            6 => MessageType::JoinGroup,
            7 => MessageType::Request,
            8 => MessageType::Response,
            kind => MessageType::Custom(kind),
        }
    }
}

impl Serde for MessageType {
    fn ser(&self, writer: &mut WireBuffer) -> Result<(), SerdeErr> {
        writer.write_u8(self.to_byte())
    }

    fn de(reader: &mut WireBuffer) -> Result<Self, SerdeErr> {
        Ok(MessageType::from_byte(reader.read_u8()?))
    }
}
