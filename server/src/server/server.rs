use std::{mem, net::SocketAddr, sync::Arc};

use log::{debug, info, trace, warn};

use rally_shared::{
    handshake::{HandshakeCrypto, KeyPair},
    transport::{PacketReceiver, PacketSender, ServerSocket, TransportEvent},
    Args, CacheMode, DeliveryMode, DispatchError, Frame, GroupId, IdentityRegistry,
    InvokeContext, Outbox, OutboxMessage, PeerId, ResponseStatus, RouteHeader, SendOptions,
    Target, ThreadGuard, TimeSync,
};

use crate::{
    cache::{CacheScope, ReplayCache},
    events::{CustomMessage, Events, GroupJoin, GroupLeave},
    group::{Departure, Group, GroupRegistry},
    peer::{Peer, PeerError, PeerRegistry, PeerState},
    route_table::{RouteError, RouteTable},
    router::MessageRouter,
    RallyServerError, ServerConfig,
};

const DISCONNECT_REASON: &str = "disconnected";

/// The server side of a networking session.
///
/// Owns every registry of the session: peers, groups, the replay cache,
/// identity handler tables and request routes. All of them are mutated on
/// the thread that created the server, from inside [`Server::receive`] or
/// the public send and membership calls.
pub struct Server {
    config: ServerConfig,
    guard: ThreadGuard,
    crypto: Arc<dyn HandshakeCrypto>,
    key_pair: KeyPair,
    // Transport
    sender: Option<Box<dyn PacketSender>>,
    receiver: Option<Box<dyn PacketReceiver>>,
    router: MessageRouter,
    // Session state
    peers: PeerRegistry,
    groups: GroupRegistry,
    cache: ReplayCache,
    identities: IdentityRegistry,
    routes: RouteTable,
    time_sync: Option<Box<dyn TimeSync>>,
    // Events
    incoming_events: Events,
}

impl Server {
    /// Creates a server using the bundled X25519 + AES-GCM handshake crypto
    #[cfg(feature = "standard_crypto")]
    pub fn new(config: ServerConfig) -> Result<Self, RallyServerError> {
        Self::with_crypto(config, Arc::new(rally_shared::handshake::StandardCrypto::new()))
    }

    pub fn with_crypto(
        config: ServerConfig,
        crypto: Arc<dyn HandshakeCrypto>,
    ) -> Result<Self, RallyServerError> {
        let key_pair = crypto.generate_key_pair()?;
        let router = MessageRouter::new(config.router.clone(), config.pool_size, crypto.clone());
        Ok(Self {
            config,
            guard: ThreadGuard::new(),
            crypto,
            key_pair,
            sender: None,
            receiver: None,
            router,
            peers: PeerRegistry::new(),
            groups: GroupRegistry::new(),
            cache: ReplayCache::new(),
            identities: IdentityRegistry::new(),
            routes: RouteTable::new(),
            time_sync: None,
            incoming_events: Events::new(),
        })
    }

    /// Starts accepting connections on `socket`
    pub fn listen<S: ServerSocket + 'static>(&mut self, socket: S) {
        self.guard.check();
        let boxed: Box<dyn ServerSocket> = Box::new(socket);
        let (sender, receiver) = boxed.listen();
        self.sender = Some(sender);
        self.receiver = Some(receiver);
        info!("server listening");
    }

    /// Returns whether or not the Server is listening for peers
    pub fn is_listening(&self) -> bool {
        self.sender.is_some() && self.receiver.is_some()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The public half of the key pair offered to connecting peers
    pub fn public_key(&self) -> &[u8] {
        self.key_pair.public_key()
    }

    pub fn set_time_sync(&mut self, time_sync: Box<dyn TimeSync>) {
        self.time_sync = Some(time_sync);
    }

    // Registration

    /// Handler tables for invokes targeted at the server, and the ownership
    /// records checked before relaying
    pub fn identities(&self) -> &IdentityRegistry {
        &self.identities
    }

    pub fn identities_mut(&mut self) -> &mut IdentityRegistry {
        self.guard.check();
        &mut self.identities
    }

    pub fn register_route<F>(&mut self, route: &str, handler: F) -> Result<(), RallyServerError>
    where
        F: FnMut(PeerId, &[u8]) -> Result<Vec<u8>, RouteError> + Send + 'static,
    {
        self.guard.check();
        Ok(self.routes.register(route, handler)?)
    }

    // Receive

    /// Must be called regularly. Drains the transport, handles every frame
    /// and returns what happened
    pub fn receive(&mut self) -> Events {
        self.guard.check();
        loop {
            let Some(receiver) = self.receiver.as_mut() else {
                break;
            };
            match receiver.receive() {
                Ok(Some(event)) => self.handle_transport_event(event),
                Ok(None) => break,
                Err(error) => {
                    warn!("Server Error: {}", error);
                    self.incoming_events.push_error(error.into());
                    break;
                }
            }
        }
        mem::replace(&mut self.incoming_events, Events::new())
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected(addr) => self.on_connect(addr),
            TransportEvent::Disconnected(addr) => match self.peers.id_of(&addr) {
                Some(peer) => self.remove_peer(peer),
                None => trace!("disconnect from unknown address {}", addr),
            },
            TransportEvent::Packet { addr, payload, .. } => self.on_packet(addr, &payload),
        }
    }

    fn on_connect(&mut self, addr: SocketAddr) {
        let peer = match self.peers.register_peer(addr) {
            Ok(peer) => peer,
            Err(error) => {
                warn!("Server Error: {}", error);
                self.incoming_events.push_error(error.into());
                return;
            }
        };
        let offer = Frame::HandshakeOffer {
            peer_id: peer,
            public_key: self.key_pair.public_key().to_vec(),
        };
        let delivery = self.config.handshake_delivery;
        if let Err(error) = self.send_direct(peer, &offer, delivery) {
            warn!("Server Error: {}", error);
            self.incoming_events.push_error(error);
        }
    }

    fn on_packet(&mut self, addr: SocketAddr, bytes: &[u8]) {
        let Some(peer) = self.peers.get_by_addr(&addr) else {
            warn!("dropping packet from unknown address {}", addr);
            return;
        };
        let peer_id = peer.id();
        let state = peer.state();
        let frame = match self.router.read_frame(peer, bytes) {
            Ok(frame) => frame,
            Err(error) => {
                self.protocol_violation(peer_id, format!("unreadable frame: {}", error));
                return;
            }
        };

        match frame {
            Frame::HandshakeReply { sealed_key } => self.on_handshake_reply(peer_id, state, &sealed_key),
            Frame::EndHandshake => self.on_handshake_end(peer_id, state),
            frame if state != PeerState::Connected => self.protocol_violation(
                peer_id,
                format!("{:?} received before the handshake completed", frame.message_type()),
            ),
            Frame::NtpQuery { body } => self.on_ntp_query(peer_id, &body),
            Frame::JoinGroup { name } => {
                if let Err(error) = self.join_group(peer_id, &name) {
                    warn!("Server Error: {}", error);
                    self.incoming_events.push_error(error);
                }
            }
            Frame::LeaveGroup { name, reason } => {
                if let Err(error) = self.leave_group(peer_id, &name, &reason) {
                    warn!("Server Error: {}", error);
                    self.incoming_events.push_error(error);
                }
            }
            Frame::Request {
                request_id,
                route,
                payload,
            } => self.on_request(peer_id, request_id, &route, &payload),
            Frame::Response { request_id, .. } => {
                warn!("{} sent a response for request {}, ignoring", peer_id, request_id);
            }
            Frame::HandshakeOffer { .. } => {
                self.protocol_violation(peer_id, "peers cannot offer handshakes".to_owned())
            }
            relayable => self.on_relayable(peer_id, relayable),
        }
    }

    // Handshake

    fn on_handshake_reply(&mut self, peer: PeerId, state: PeerState, sealed_key: &[u8]) {
        if state != PeerState::HandshakeBegin {
            self.protocol_violation(peer, format!("session key received in state {:?}", state));
            return;
        }
        let key = match self.crypto.open_session_key(&self.key_pair, sealed_key) {
            Ok(key) => key,
            Err(error) => {
                self.protocol_violation(peer, format!("cannot open session key: {}", error));
                return;
            }
        };
        if let Err(error) = self.peers.set_session_key(&peer, key) {
            warn!("Server Error: {}", error);
            return;
        }
        if let Some(record) = self.peers.get_mut(&peer) {
            record.set_state(PeerState::HandshakeEnd);
        }
        let delivery = self.config.handshake_delivery;
        if let Err(error) = self.send_direct(peer, &Frame::EndHandshake, delivery) {
            warn!("Server Error: {}", error);
            self.incoming_events.push_error(error);
        }
    }

    fn on_handshake_end(&mut self, peer: PeerId, state: PeerState) {
        if state != PeerState::HandshakeEnd {
            self.protocol_violation(
                peer,
                format!("handshake acknowledgement received in state {:?}", state),
            );
            return;
        }
        if let Some(record) = self.peers.get_mut(&peer) {
            record.set_state(PeerState::Connected);
        }
        info!("{} connected", peer);
        self.incoming_events.push_connection(peer);

        if self.config.router.replay_global_cache_on_connect {
            self.replay_scope(peer, CacheScope::Global);
        }
    }

    // Invokes & custom messages

    fn on_relayable(&mut self, sender: PeerId, mut frame: Frame) {
        let Some(header) = frame.header_mut() else {
            return;
        };
        // never trust the sender field written by the peer
        header.sender = sender;
        let options = header.options;

        if let Frame::Custom { kind, payload, .. } = &frame {
            self.incoming_events.push_custom(CustomMessage {
                sender,
                kind: *kind,
                payload: payload.clone(),
            });
        }

        let invoke = match &frame {
            Frame::LocalInvoke {
                identity,
                instance,
                method,
                args,
                ..
            } => Some((
                InvokeContext {
                    sender,
                    identity: *identity,
                    instance: Some(*instance),
                    method: *method,
                },
                args.clone(),
            )),
            Frame::GlobalInvoke {
                identity,
                method,
                args,
                ..
            } => Some((
                InvokeContext {
                    sender,
                    identity: *identity,
                    instance: None,
                    method: *method,
                },
                args.clone(),
            )),
            _ => None,
        };

        if options.target == Target::Server {
            if let Some((ctx, args)) = invoke {
                self.invoke_local_handler(ctx, &args);
            }
            return;
        }

        if let Some((ctx, _)) = &invoke {
            if let Err(error @ DispatchError::OwnershipViolation { .. }) = self.identities.authorize(ctx) {
                self.incoming_events.push_error(error.into());
                return;
            }
        }

        if let Err(error) = self.route_frame(&frame) {
            warn!("Server Error: {}", error);
            self.incoming_events.push_error(error);
        }
    }

    fn invoke_local_handler(&mut self, ctx: InvokeContext, args: &Args) {
        let mut outbox = Outbox::new();
        let result = match ctx.instance {
            Some(_) => self.identities.invoke_local(&ctx, args, &mut outbox),
            None => self.identities.invoke_global(&ctx, args, &mut outbox),
        };
        match result {
            Ok(()) => {}
            Err(error @ DispatchError::ArityMismatch { .. }) => {
                self.protocol_violation(ctx.sender, error.to_string());
                return;
            }
            Err(error) => {
                warn!("Server Error: {}", error);
                self.incoming_events.push_error(error.into());
            }
        }
        self.flush_outbox(outbox);
    }

    fn flush_outbox(&mut self, mut outbox: Outbox) {
        for message in outbox.drain() {
            let frame = message.into_frame(PeerId::SERVER);
            if let Err(error) = self.route_frame(&frame) {
                warn!("Server Error: {}", error);
                self.incoming_events.push_error(error);
            }
        }
    }

    // Requests & time sync

    fn on_request(&mut self, peer: PeerId, request_id: u32, route: &str, payload: &[u8]) {
        let (status, body) = match self.routes.handle(peer, route, payload) {
            Ok(body) => (ResponseStatus::Ok, body),
            Err(error @ RouteError::NotFound { .. }) => {
                warn!("{} requested {}", peer, error);
                (ResponseStatus::NotFound, error.to_string().into_bytes())
            }
            Err(error) => (ResponseStatus::Rejected, error.to_string().into_bytes()),
        };
        let response = Frame::Response {
            request_id,
            status,
            payload: body,
        };
        if let Err(error) = self.send_direct(peer, &response, DeliveryMode::ReliableOrdered) {
            warn!("Server Error: {}", error);
            self.incoming_events.push_error(error);
        }
    }

    fn on_ntp_query(&mut self, peer: PeerId, body: &[u8]) {
        let Some(time_sync) = self.time_sync.as_mut() else {
            debug!("no time sync collaborator, dropping query from {}", peer);
            return;
        };
        let Some(reply) = time_sync.handle(peer, body) else {
            return;
        };
        let frame = Frame::NtpQuery { body: reply };
        if let Err(error) = self.send_direct(peer, &frame, DeliveryMode::Unreliable) {
            warn!("Server Error: {}", error);
        }
    }

    // Sending

    /// Sends a message from the server's pseudo-peer. Returns its recipients
    pub fn send(&mut self, message: OutboxMessage) -> Result<Vec<PeerId>, RallyServerError> {
        self.guard.check();
        self.route_frame(&message.into_frame(PeerId::SERVER))
    }

    /// Sends a message as if `sender` had sent it, with the same group rules
    pub fn send_as(
        &mut self,
        sender: PeerId,
        message: OutboxMessage,
    ) -> Result<Vec<PeerId>, RallyServerError> {
        self.guard.check();
        if !self.peers.contains(&sender) {
            return Err(PeerError::UnknownPeer { peer: sender }.into());
        }
        self.route_frame(&message.into_frame(sender))
    }

    pub fn send_custom(
        &mut self,
        kind: u8,
        payload: Vec<u8>,
        options: SendOptions,
    ) -> Result<Vec<PeerId>, RallyServerError> {
        self.send(OutboxMessage::Custom {
            kind,
            payload,
            options,
        })
    }

    /// Sends a custom message to exactly one peer
    pub fn send_custom_to(
        &mut self,
        peer: PeerId,
        kind: u8,
        payload: Vec<u8>,
        delivery: DeliveryMode,
    ) -> Result<(), RallyServerError> {
        self.guard.check();
        let frame = Frame::Custom {
            kind,
            header: RouteHeader::new(
                PeerId::SERVER,
                SendOptions::to(Target::OnlySelf).delivery(delivery),
            ),
            payload,
        };
        self.send_direct(peer, &frame, delivery)
    }

    fn route_frame(&mut self, frame: &Frame) -> Result<Vec<PeerId>, RallyServerError> {
        let sender = self
            .sender
            .as_deref()
            .ok_or(RallyServerError::NotListening)?;
        Ok(self
            .router
            .route(frame, &self.peers, &self.groups, &mut self.cache, sender)?)
    }

    fn send_direct(
        &self,
        peer: PeerId,
        frame: &Frame,
        delivery: DeliveryMode,
    ) -> Result<(), RallyServerError> {
        let sender = self
            .sender
            .as_deref()
            .ok_or(RallyServerError::NotListening)?;
        Ok(self
            .router
            .send_frame(&self.peers, sender, peer, frame, delivery, 0)?)
    }

    // Groups

    /// Adds `peer` to the group `name`, acknowledges it to the peer and
    /// replays the group's cache when configured to
    pub fn join_group(&mut self, peer: PeerId, name: &str) -> Result<GroupId, RallyServerError> {
        self.guard.check();
        let destroy_when_empty = self.config.router.destroy_empty_groups;
        let group_id = self
            .groups
            .join(&mut self.peers, peer, name, destroy_when_empty)?;

        let ack = Frame::JoinGroup {
            name: name.to_owned(),
        };
        if let Err(error) = self.send_direct(peer, &ack, DeliveryMode::ReliableOrdered) {
            warn!("Server Error: {}", error);
        }
        self.incoming_events.push_join(GroupJoin {
            peer,
            group_id,
            name: name.to_owned(),
        });
        if self.config.router.replay_group_cache_on_join {
            self.replay_scope(peer, CacheScope::Group(group_id));
        }
        Ok(group_id)
    }

    /// Removes `peer` from the group `name` and acknowledges it to the peer
    pub fn leave_group(
        &mut self,
        peer: PeerId,
        name: &str,
        reason: &str,
    ) -> Result<Departure, RallyServerError> {
        self.guard.check();
        let departure = self.groups.leave(&mut self.peers, peer, name)?;
        if departure.destroyed {
            self.cache.destroy_for_group(departure.group_id);
        }
        let ack = Frame::LeaveGroup {
            name: departure.name.clone(),
            reason: reason.to_owned(),
        };
        if let Err(error) = self.send_direct(peer, &ack, DeliveryMode::ReliableOrdered) {
            warn!("Server Error: {}", error);
        }
        self.push_departure(peer, &departure, reason);
        Ok(departure)
    }

    /// Creates an empty group ahead of its first join
    pub fn create_group(&mut self, name: &str, destroy_when_empty: bool) -> GroupId {
        self.guard.check();
        self.groups.create(name, destroy_when_empty)
    }

    /// Destroys a group, evicting its members and clearing its caches
    pub fn destroy_group(&mut self, group_id: &GroupId) -> Option<Group> {
        self.guard.check();
        let group = self.groups.destroy(&mut self.peers, group_id)?;
        self.cache.destroy_for_group(*group_id);
        Some(group)
    }

    // Cache

    /// Re-sends the entries stored under `cache_id` and `mode` to `peer`
    pub fn replay_cache(
        &mut self,
        peer: PeerId,
        cache_id: u32,
        mode: CacheMode,
        group_id: GroupId,
        include_own: bool,
    ) -> Result<usize, RallyServerError> {
        self.guard.check();
        let sender = self
            .sender
            .as_deref()
            .ok_or(RallyServerError::NotListening)?;
        let messages = self
            .cache
            .replay(peer, cache_id, mode, group_id, include_own);
        Ok(self.router.replay(&self.peers, sender, peer, &messages))
    }

    pub fn remove_cache(&mut self, cache_id: u32, mode: CacheMode, group_id: GroupId) -> usize {
        self.guard.check();
        self.cache.remove(cache_id, mode, group_id)
    }

    pub fn cache(&self) -> &ReplayCache {
        &self.cache
    }

    fn replay_scope(&mut self, peer: PeerId, scope: CacheScope) {
        let Some(sender) = self.sender.as_deref() else {
            return;
        };
        let messages = self.cache.replay_all(peer, scope, false);
        if messages.is_empty() {
            return;
        }
        let sent = self.router.replay(&self.peers, sender, peer, &messages);
        debug!("replayed {} cached messages to {}", sent, peer);
    }

    // Peers & groups

    pub fn peer(&self, peer: &PeerId) -> Option<&Peer> {
        self.peers.get(peer)
    }

    /// Mutable access, mainly for the peer's data store
    pub fn peer_mut(&mut self, peer: &PeerId) -> Option<&mut Peer> {
        self.peers.get_mut(peer)
    }

    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.peers.ids()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn group(&self, group_id: &GroupId) -> Option<&Group> {
        self.groups.get(group_id)
    }

    pub fn group_by_name(&self, name: &str) -> Option<&Group> {
        self.groups.get_by_name(name)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    // Teardown

    /// Closes the connection to `peer` and forgets it
    pub fn disconnect(&mut self, peer: PeerId) -> Result<(), RallyServerError> {
        self.guard.check();
        let addr = self
            .peers
            .get(&peer)
            .map(|record| record.addr())
            .ok_or(PeerError::UnknownPeer { peer })?;
        if let Some(sender) = self.sender.as_deref() {
            sender.disconnect(&addr)?;
        }
        self.remove_peer(peer);
        Ok(())
    }

    /// Disconnects every peer, clears every registry and releases the transport
    pub fn stop(&mut self) {
        self.guard.check();
        for peer in self.peers.ids() {
            if let Err(error) = self.disconnect(peer) {
                warn!("Server Error: {}", error);
                self.remove_peer(peer);
            }
        }
        self.groups.clear();
        self.cache.clear();
        self.peers.clear();
        self.sender = None;
        self.receiver = None;
        info!("server stopped");
    }

    fn protocol_violation(&mut self, peer: PeerId, reason: String) {
        warn!("Server Error: protocol violation by {}: {}", peer, reason);
        if let (Some(sender), Some(record)) = (self.sender.as_deref(), self.peers.get(&peer)) {
            if let Err(error) = sender.disconnect(&record.addr()) {
                warn!("Server Error: {}", error);
            }
        }
        self.remove_peer(peer);
        self.incoming_events
            .push_error(RallyServerError::ProtocolViolation { peer, reason });
    }

    /// Groups first so emptied groups are evaluated, then the peer's
    /// auto-destroy cache entries, then the peer itself
    fn remove_peer(&mut self, peer: PeerId) {
        for departure in self.groups.leave_all(&mut self.peers, peer) {
            if departure.destroyed {
                self.cache.destroy_for_group(departure.group_id);
            }
            self.push_departure(peer, &departure, DISCONNECT_REASON);
        }
        self.cache.destroy_for_peer(peer);
        if let Some(record) = self.peers.remove(&peer) {
            if record.is_connected() {
                self.incoming_events.push_disconnection(peer, record.addr());
            }
        }
    }

    fn push_departure(&mut self, peer: PeerId, departure: &Departure, reason: &str) {
        self.incoming_events.push_leave(GroupLeave {
            peer,
            group_id: departure.group_id,
            name: departure.name.clone(),
            reason: reason.to_owned(),
            destroyed: departure.destroyed,
        });
    }
}
