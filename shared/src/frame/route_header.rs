use rally_serde::{Serde, SerdeErr, WireBuffer};

use crate::{CacheMode, DeliveryMode, GroupId, PeerId, SendOptions, Target};

/// Routing fields carried by every relayable frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteHeader {
    /// Originating peer. Rewritten by the server with the authenticated id
    pub sender: PeerId,
    pub options: SendOptions,
}

impl RouteHeader {
    pub fn new(sender: PeerId, options: SendOptions) -> Self {
        Self { sender, options }
    }
}

impl Serde for RouteHeader {
    fn ser(&self, writer: &mut WireBuffer) -> Result<(), SerdeErr> {
        writer.write_var_u32(self.sender.get())?;
        self.options.target.ser(writer)?;
        self.options.delivery.ser(writer)?;
        writer.write_u8(self.options.channel)?;
        writer.write_var_u32(self.options.group_id.get())?;
        self.options.cache_mode.ser(writer)?;
        writer.write_var_u32(self.options.cache_id)
    }

    fn de(reader: &mut WireBuffer) -> Result<Self, SerdeErr> {
        let sender = PeerId::new(reader.read_var_u32()?);
        let target = Target::de(reader)?;
        let delivery = DeliveryMode::de(reader)?;
        let channel = reader.read_u8()?;
        let group_id = GroupId::new(reader.read_var_u32()?);
        let cache_mode = CacheMode::de(reader)?;
        let cache_id = reader.read_var_u32()?;
        Ok(Self {
            sender,
            options: SendOptions {
                target,
                delivery,
                channel,
                group_id,
                cache_id,
                cache_mode,
            },
        })
    }
}
