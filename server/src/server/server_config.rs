use std::default::Default;

use rally_shared::{DeliveryMode, RouterConfig};

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Routing, caching and encryption policy
    pub router: RouterConfig,
    /// Delivery mode used for handshake frames
    pub handshake_delivery: DeliveryMode,
    /// Number of idle frame buffers kept for reuse
    pub pool_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            router: RouterConfig::default(),
            handshake_delivery: DeliveryMode::ReliableOrdered,
            pool_size: 64,
        }
    }
}
