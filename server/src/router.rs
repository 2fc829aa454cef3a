use std::sync::Arc;

use log::{trace, warn};
use thiserror::Error;

use rally_shared::{
    handshake::HandshakeCrypto,
    open_frame, seal_frame,
    transport::{PacketSender, TransportError},
    BufferPool, DeliveryMode, Frame, FrameError, HostType, MessageType, PeerId, RouterConfig,
    SendOptions, SequenceChannel, Target,
};

use crate::{
    cache::{CacheError, CachedMessage, ReplayCache},
    group::{GroupRegistry, TargetError},
    peer::{Peer, PeerRegistry},
};

/// Reasons an outbound frame was not routed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// Only invokes and custom messages carry a route header
    #[error("{message_type:?} frames cannot be routed")]
    NotRelayable { message_type: MessageType },

    /// Group-scoped sends need an explicit group unless zero-group sends are allowed
    #[error("{target:?} send without a group id, zero-group sends are disabled")]
    ZeroGroup { target: Target },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("{peer} is not registered")]
    UnknownPeer { peer: PeerId },

    /// Encrypted traffic needs the session key from a completed handshake
    #[error("{peer} has no session key yet")]
    MissingSessionKey { peer: PeerId },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Outbound half of the protocol: validates, frames, fans out, caches and
/// encrypts per recipient. Also unframes inbound packets
pub struct MessageRouter {
    config: RouterConfig,
    pool: BufferPool,
    crypto: Arc<dyn HandshakeCrypto>,
}

impl MessageRouter {
    pub fn new(config: RouterConfig, pool_size: usize, crypto: Arc<dyn HandshakeCrypto>) -> Self {
        let pool = BufferPool::with_encoding(config.max_frame_size, pool_size, config.text_encoding);
        Self {
            config,
            pool,
            crypto,
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Checks the send parameters before anything is framed or sent
    pub fn validate(&self, options: &SendOptions) -> Result<(), RouterError> {
        options
            .cache_mode
            .validate(options.cache_id)
            .map_err(CacheError::from)?;
        let group_scoped = options.target.is_group_scoped() || options.cache_mode.is_group_scoped();
        if group_scoped && options.group_id.is_none() && !self.config.allow_zero_group {
            return Err(RouterError::ZeroGroup {
                target: options.target,
            });
        }
        if options.target == Target::OnlySelf && !options.group_id.is_none() && !options.is_cached()
        {
            warn!(
                "OnlySelf send scoped to {} without caching, the group has no effect",
                options.group_id
            );
        }
        Ok(())
    }

    /// Routes a relayable frame to every recipient its header resolves to,
    /// storing it in the replay cache first when it asks to be cached.
    /// Returns the peers it was handed to
    pub fn route(
        &self,
        frame: &Frame,
        peers: &PeerRegistry,
        groups: &GroupRegistry,
        cache: &mut ReplayCache,
        transport: &dyn PacketSender,
    ) -> Result<Vec<PeerId>, RouterError> {
        let header = frame.header().ok_or(RouterError::NotRelayable {
            message_type: frame.message_type(),
        })?;
        let options = header.options;
        self.validate(&options)?;
        if options.is_cached() && options.cache_mode.is_group_scoped() && !options.group_id.is_none() {
            groups.check_access(header.sender, options.group_id, &self.config)?;
        }

        let buffer = frame.to_buffer(&self.pool)?;
        let recipients = groups.resolve_targets(peers, header.sender, &options, &self.config)?;

        if options.is_cached() {
            cache.store(CachedMessage {
                cache_id: options.cache_id,
                mode: options.cache_mode,
                frame: buffer.to_vec(),
                origin: header.sender,
                delivery: options.delivery,
                target: options.target,
                channel: options.channel,
                group_id: options.group_id,
            })?;
        }

        let mut delivered = Vec::with_capacity(recipients.len());
        for peer in recipients {
            match self.send_bytes(
                peers,
                transport,
                peer,
                buffer.as_bytes(),
                options.delivery,
                options.channel,
            ) {
                Ok(()) => delivered.push(peer),
                Err(error) => warn!("failed to deliver to {}: {}", peer, error),
            }
        }
        trace!(
            "routed {:?} from {} to {} peers",
            frame.message_type(),
            header.sender,
            delivered.len()
        );
        Ok(delivered)
    }

    /// Sends one frame straight to one peer, bypassing fan-out and caching
    pub fn send_frame(
        &self,
        peers: &PeerRegistry,
        transport: &dyn PacketSender,
        peer: PeerId,
        frame: &Frame,
        delivery: DeliveryMode,
        channel: SequenceChannel,
    ) -> Result<(), RouterError> {
        let buffer = frame.to_buffer(&self.pool)?;
        self.send_bytes(peers, transport, peer, buffer.as_bytes(), delivery, channel)
    }

    /// Re-sends cached frames to one peer. Returns how many went out
    pub fn replay(
        &self,
        peers: &PeerRegistry,
        transport: &dyn PacketSender,
        peer: PeerId,
        messages: &[&CachedMessage],
    ) -> usize {
        let mut sent = 0;
        for message in messages {
            match self.send_bytes(
                peers,
                transport,
                peer,
                &message.frame,
                message.delivery,
                message.channel,
            ) {
                Ok(()) => sent += 1,
                Err(error) => warn!("failed to replay cache id {} to {}: {}", message.cache_id, peer, error),
            }
        }
        sent
    }

    /// Encrypts `frame` for `peer` when payload encryption is on and hands it to the transport
    pub fn send_bytes(
        &self,
        peers: &PeerRegistry,
        transport: &dyn PacketSender,
        peer: PeerId,
        frame: &[u8],
        delivery: DeliveryMode,
        channel: SequenceChannel,
    ) -> Result<(), RouterError> {
        let record = peers.get(&peer).ok_or(RouterError::UnknownPeer { peer })?;
        if self.config.encrypt_payloads && !is_handshake(frame) {
            let key = record
                .session_key()
                .ok_or(RouterError::MissingSessionKey { peer })?;
            let sealed = seal_frame(self.crypto.as_ref(), key, frame)?;
            transport.send(&record.addr(), &sealed, delivery, channel)?;
        } else {
            transport.send(&record.addr(), frame, delivery, channel)?;
        }
        Ok(())
    }

    /// Decrypts and decodes a packet received from `peer`
    pub fn read_frame(&self, peer: &Peer, bytes: &[u8]) -> Result<Frame, RouterError> {
        if self.config.encrypt_payloads && !is_handshake(bytes) {
            let key = peer.session_key().ok_or(RouterError::MissingSessionKey {
                peer: peer.id(),
            })?;
            let plaintext = open_frame(self.crypto.as_ref(), key, bytes)?;
            return Ok(Frame::decode(&plaintext, &self.pool, HostType::Server)?);
        }
        Ok(Frame::decode(bytes, &self.pool, HostType::Server)?)
    }
}

fn is_handshake(frame: &[u8]) -> bool {
    frame
        .first()
        .map(|kind| MessageType::from_byte(*kind).is_handshake())
        .unwrap_or(false)
}
