use std::default::Default;

use rally_serde::TextEncoding;

/// Routing policy shared by the server's router and its registries
#[derive(Clone, Debug)]
pub struct RouterConfig {
    /// Accept group-scoped targets and caches that carry group id 0
    pub allow_zero_group: bool,
    /// Let a peer send into a group it is not a member of
    pub allow_cross_group: bool,
    /// Destroy a group, and its caches, when its last member leaves
    pub destroy_empty_groups: bool,
    /// Replay the global cache to a peer once its handshake completes
    pub replay_global_cache_on_connect: bool,
    /// Replay a group's cache to a peer joining it
    pub replay_group_cache_on_join: bool,
    /// Encrypt every non-handshake frame with the peer's session key.
    /// Must match the clients' setting
    pub encrypt_payloads: bool,
    pub text_encoding: TextEncoding,
    /// Size of pooled frame buffers, the largest frame that can be written
    pub max_frame_size: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            allow_zero_group: false,
            allow_cross_group: false,
            destroy_empty_groups: true,
            replay_global_cache_on_connect: true,
            replay_group_cache_on_join: true,
            encrypt_payloads: true,
            text_encoding: TextEncoding::Utf8,
            max_frame_size: 8192,
        }
    }
}
