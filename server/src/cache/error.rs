use thiserror::Error;

use rally_shared::CacheModeError;

/// Reasons a message could not be cached
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The cache id / cache mode pair is inconsistent
    #[error("Invalid cache request: {0}")]
    InvalidMode(#[from] CacheModeError),

    /// Group-scoped caches belong to a concrete group
    #[error("Cache id {cache_id} is group-scoped but the message carries no group id")]
    GroupRequired { cache_id: u32 },
}
