use bitflags::bitflags;
use thiserror::Error;

use rally_serde::{Serde, SerdeErr, WireBuffer};

bitflags! {
    /// Replay-cache policy: {NEW, OVERWRITE} x {GLOBAL, GROUP}, plus AUTO_DESTROY
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct CacheMode: u8 {
        /// Append to the cache list
        const NEW = 1;
        /// Keep only the latest entry for the cache id
        const OVERWRITE = 1 << 1;
        /// Replayed to every peer after its handshake
        const GLOBAL = 1 << 2;
        /// Replayed to peers joining the group
        const GROUP = 1 << 3;
        /// Removed once the origin peer disconnects
        const AUTO_DESTROY = 1 << 4;
    }
}

/// Reasons a cache id / cache mode pair cannot be stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CacheModeError {
    #[error("Cache id {cache_id} was given without a cache mode")]
    IdWithoutMode { cache_id: u32 },

    #[error("Cache mode {mode:?} was given with cache id 0")]
    ModeWithoutId { mode: CacheMode },

    #[error("Cache mode {mode:?} must set exactly one of NEW or OVERWRITE")]
    AmbiguousPolicy { mode: CacheMode },

    #[error("Cache mode {mode:?} must set exactly one of GLOBAL or GROUP")]
    AmbiguousScope { mode: CacheMode },
}

impl CacheMode {
    /// Checks that the id and the mode travel together and that the mode
    /// picks exactly one policy and one scope
    pub fn validate(&self, cache_id: u32) -> Result<(), CacheModeError> {
        match (cache_id, self.is_empty()) {
            (0, true) => return Ok(()),
            (0, false) => return Err(CacheModeError::ModeWithoutId { mode: *self }),
            (cache_id, true) => return Err(CacheModeError::IdWithoutMode { cache_id }),
            _ => {}
        }
        if self.contains(CacheMode::NEW) == self.contains(CacheMode::OVERWRITE) {
            return Err(CacheModeError::AmbiguousPolicy { mode: *self });
        }
        if self.contains(CacheMode::GLOBAL) == self.contains(CacheMode::GROUP) {
            return Err(CacheModeError::AmbiguousScope { mode: *self });
        }
        Ok(())
    }

    pub fn is_overwrite(&self) -> bool {
        self.contains(CacheMode::OVERWRITE)
    }

    pub fn is_group_scoped(&self) -> bool {
        self.contains(CacheMode::GROUP)
    }

    pub fn auto_destroys(&self) -> bool {
        self.contains(CacheMode::AUTO_DESTROY)
    }
}

impl Serde for CacheMode {
    fn ser(&self, writer: &mut WireBuffer) -> Result<(), SerdeErr> {
        writer.write_u8(self.bits())
    }

    fn de(reader: &mut WireBuffer) -> Result<Self, SerdeErr> {
        let bits = reader.read_u8()?;
        CacheMode::from_bits(bits).ok_or(SerdeErr::UnknownTag {
            tag: bits,
            type_name: "CacheMode",
        })
    }
}
