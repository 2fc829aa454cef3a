use rally_serde::{Serde, SerdeErr, WireBuffer};

/// The reliability and ordering contract requested for a send
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DeliveryMode {
    /// May be dropped, duplicated or reordered
    Unreliable,
    /// Always arrives, in any order
    ReliableUnordered,
    /// May be dropped; stale packets are discarded
    Sequenced,
    /// Always arrives, in send order
    #[default]
    ReliableOrdered,
    /// Only the latest of a back-pressured run is kept. Never fragments
    ReliableSequenced,
}

impl DeliveryMode {
    pub fn is_reliable(&self) -> bool {
        matches!(
            self,
            DeliveryMode::ReliableUnordered
                | DeliveryMode::ReliableOrdered
                | DeliveryMode::ReliableSequenced
        )
    }

    fn to_byte(self) -> u8 {
        match self {
            DeliveryMode::Unreliable => 0,
            DeliveryMode::ReliableUnordered => 1,
            DeliveryMode::Sequenced => 2,
            DeliveryMode::ReliableOrdered => 3,
            DeliveryMode::ReliableSequenced => 4,
        }
    }
}

impl Serde for DeliveryMode {
    fn ser(&self, writer: &mut WireBuffer) -> Result<(), SerdeErr> {
        writer.write_u8(self.to_byte())
    }

    fn de(reader: &mut WireBuffer) -> Result<Self, SerdeErr> {
        match reader.read_u8()? {
            0 => Ok(DeliveryMode::Unreliable),
            1 => Ok(DeliveryMode::ReliableUnordered),
            2 => Ok(DeliveryMode::Sequenced),
            3 => Ok(DeliveryMode::ReliableOrdered),
            4 => Ok(DeliveryMode::ReliableSequenced),
            tag => Err(SerdeErr::UnknownTag {
                tag,
                type_name: "DeliveryMode",
            }),
        }
    }
}
