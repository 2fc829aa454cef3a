mod cache_table;
mod cached_message;
mod error;
mod replay_cache;

pub use cache_table::CacheTable;
pub use cached_message::CachedMessage;
pub use error::CacheError;
pub use replay_cache::{CacheScope, ReplayCache};
