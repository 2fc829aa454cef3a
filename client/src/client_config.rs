use std::{default::Default, time::Duration};

use rally_shared::{DeliveryMode, TextEncoding};

/// Contains Config properties which will be used by a Client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Encrypt every non-handshake frame with the session key. Must match
    /// the server's setting
    pub encrypt_payloads: bool,
    /// How long a request waits for its response before failing with a
    /// timeout
    pub request_timeout: Duration,
    pub text_encoding: TextEncoding,
    /// Capacity of pooled frame buffers
    pub max_frame_size: usize,
    pub pool_size: usize,
    /// Delivery mode used for handshake frames
    pub handshake_delivery: DeliveryMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            encrypt_payloads: true,
            request_timeout: Duration::from_secs(10),
            text_encoding: TextEncoding::default(),
            max_frame_size: 8192,
            pool_size: 32,
            handshake_delivery: DeliveryMode::ReliableOrdered,
        }
    }
}
