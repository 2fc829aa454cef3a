use std::{
    collections::{BTreeMap, HashMap},
    mem,
    net::SocketAddr,
    sync::Arc,
    time::Instant,
};

use log::{debug, info, trace, warn};

use rally_shared::{
    handshake::{HandshakeCrypto, SessionKey},
    open_frame, seal_frame,
    transport::{ClientSocket, PacketReceiver, PacketSender, TransportEvent},
    Args, BufferPool, DeliveryMode, DispatchError, Frame, GroupId, HostType, IdentityId,
    IdentityRegistry, InstanceId, InvokeContext, MessageType, MethodId, Outbox, OutboxMessage,
    PeerId, RequestError, RequestTracker, ResponseReceiveKey, ResponseStatus, SendOptions,
    SequenceChannel, ThreadGuard, TimeSync,
};

use crate::{
    events::{CustomMessage, Events, GroupJoin, GroupLeave},
    ClientConfig, HandshakeError, RallyClientError,
};

/// Where the client is in its connection to the server
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    /// Transport opened, waiting for the server's offer
    Connecting,
    /// Offer received, sealing the session key
    HandshakeBegin,
    /// Session key sent, waiting for the server to confirm
    HandshakeEnd,
    Connected,
}

/// Client can connect to a server, join its groups, invoke handlers on
/// other peers and issue requests against the server's routes
pub struct Client {
    config: ClientConfig,
    guard: ThreadGuard,
    crypto: Arc<dyn HandshakeCrypto>,
    pool: BufferPool,
    // Transport
    sender: Option<Box<dyn PacketSender>>,
    receiver: Option<Box<dyn PacketReceiver>>,
    server_addr: Option<SocketAddr>,
    // Session
    state: ConnectionState,
    peer_id: Option<PeerId>,
    session_key: Option<SessionKey>,
    groups: BTreeMap<GroupId, String>,
    identities: IdentityRegistry,
    requests: RequestTracker,
    request_routes: HashMap<u32, String>,
    time_sync: Option<Box<dyn TimeSync>>,
    // Events
    incoming_events: Events,
}

impl Client {
    /// Create a new Client using the bundled X25519 + AES-GCM handshake crypto
    #[cfg(feature = "standard_crypto")]
    pub fn new(config: ClientConfig) -> Self {
        Self::with_crypto(config, Arc::new(rally_shared::handshake::StandardCrypto::new()))
    }

    pub fn with_crypto(config: ClientConfig, crypto: Arc<dyn HandshakeCrypto>) -> Self {
        let pool = BufferPool::with_encoding(
            config.max_frame_size,
            config.pool_size,
            config.text_encoding,
        );
        Self {
            config,
            guard: ThreadGuard::new(),
            crypto,
            pool,
            sender: None,
            receiver: None,
            server_addr: None,
            state: ConnectionState::Disconnected,
            peer_id: None,
            session_key: None,
            groups: BTreeMap::new(),
            identities: IdentityRegistry::new(),
            requests: RequestTracker::new(),
            request_routes: HashMap::new(),
            time_sync: None,
            incoming_events: Events::new(),
        }
    }

    /// Connect to the given server address. The handshake completes during
    /// later calls to [`Client::receive`]
    pub fn connect<S: ClientSocket + 'static>(
        &mut self,
        socket: S,
        server_addr: SocketAddr,
    ) -> Result<(), RallyClientError> {
        self.guard.check();
        if self.state != ConnectionState::Disconnected {
            return Err(RallyClientError::AlreadyConnected);
        }
        let boxed: Box<dyn ClientSocket> = Box::new(socket);
        let (sender, receiver) = boxed.connect(server_addr);
        self.sender = Some(sender);
        self.receiver = Some(receiver);
        self.server_addr = Some(server_addr);
        self.state = ConnectionState::Connecting;
        info!("connecting to {}", server_addr);
        Ok(())
    }

    /// Returns whether or not the client has completed the handshake
    pub fn is_client_active(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    /// The id the server assigned to this client
    pub fn peer_id(&self) -> Option<PeerId> {
        self.peer_id
    }

    pub fn server_address(&self) -> Option<SocketAddr> {
        self.server_addr
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn set_time_sync(&mut self, time_sync: Box<dyn TimeSync>) {
        self.time_sync = Some(time_sync);
    }

    pub fn identities(&self) -> &IdentityRegistry {
        &self.identities
    }

    pub fn identities_mut(&mut self) -> &mut IdentityRegistry {
        self.guard.check();
        &mut self.identities
    }

    /// Groups the server has confirmed this client is a member of
    pub fn groups(&self) -> impl Iterator<Item = (&GroupId, &str)> {
        self.groups.iter().map(|(id, name)| (id, name.as_str()))
    }

    pub fn is_in_group(&self, name: &str) -> bool {
        self.groups.contains_key(&GroupId::from_name(name))
    }

    // Receive

    /// Must be called regularly, performs the handshake, handles incoming
    /// frames and expires requests that ran out of time
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
                    warn!("Client Error: {}", error);
                    self.incoming_events.push_error(error.into());
                    break;
                }
            }
        }

        for request_id in self.requests.expire(Instant::now()) {
            self.request_routes.remove(&request_id);
            warn!("request {} timed out", request_id);
        }

        mem::replace(&mut self.incoming_events, Events::new())
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected(addr) => trace!("transport open to {}", addr),
            TransportEvent::Disconnected(addr) => {
                if Some(addr) == self.server_addr {
                    info!("server at {} closed the connection", addr);
                    self.teardown();
                }
            }
            TransportEvent::Packet { addr, payload, .. } => {
                if Some(addr) != self.server_addr {
                    warn!("dropping packet from unexpected address {}", addr);
                    return;
                }
                self.on_packet(&payload);
            }
        }
    }

    fn on_packet(&mut self, bytes: &[u8]) {
        let frame = match self.read_frame(bytes) {
            Ok(frame) => frame,
            Err(error) => {
                self.fail_connection(RallyClientError::ProtocolViolation {
                    reason: format!("unreadable frame: {}", error),
                });
                return;
            }
        };

        match frame {
            Frame::HandshakeOffer {
                peer_id,
                public_key,
            } => self.on_handshake_offer(peer_id, &public_key),
            Frame::EndHandshake => self.on_handshake_end(),
            frame if self.state != ConnectionState::Connected => {
                self.fail_connection(RallyClientError::ProtocolViolation {
                    reason: format!(
                        "{:?} received before the handshake completed",
                        frame.message_type()
                    ),
                })
            }
            Frame::NtpQuery { body } => self.on_ntp_query(&body),
            Frame::LocalInvoke {
                header,
                identity,
                instance,
                method,
                args,
            } => self.invoke(
                InvokeContext {
                    sender: header.sender,
                    identity,
                    instance: Some(instance),
                    method,
                },
                &args,
            ),
            Frame::GlobalInvoke {
                header,
                identity,
                method,
                args,
            } => self.invoke(
                InvokeContext {
                    sender: header.sender,
                    identity,
                    instance: None,
                    method,
                },
                &args,
            ),
            Frame::Custom {
                kind,
                header,
                payload,
            } => self.incoming_events.push_custom(CustomMessage {
                sender: header.sender,
                kind,
                payload,
            }),
            Frame::JoinGroup { name } => {
                let group_id = GroupId::from_name(&name);
                self.groups.insert(group_id, name.clone());
                info!("joined group '{}'", name);
                self.incoming_events.push_join(GroupJoin { group_id, name });
            }
            Frame::LeaveGroup { name, reason } => {
                let group_id = GroupId::from_name(&name);
                self.groups.remove(&group_id);
                info!("left group '{}': {}", name, reason);
                self.incoming_events.push_leave(GroupLeave {
                    group_id,
                    name,
                    reason,
                });
            }
            Frame::Response {
                request_id,
                status,
                payload,
            } => self.on_response(request_id, status, payload),
            Frame::HandshakeReply { .. } | Frame::Request { .. } => {
                self.fail_connection(RallyClientError::ProtocolViolation {
                    reason: "server sent a client-only message".to_owned(),
                })
            }
        }
    }

    // Handshake

    fn on_handshake_offer(&mut self, peer_id: PeerId, public_key: &[u8]) {
        if self.state != ConnectionState::Connecting {
            self.fail_connection(
                HandshakeError::UnexpectedMessage {
                    message: "handshake offer",
                    state: self.state,
                }
                .into(),
            );
            return;
        }
        if peer_id.is_server() {
            self.fail_connection(HandshakeError::ReservedPeerId.into());
            return;
        }
        self.state = ConnectionState::HandshakeBegin;

        let sealed = self.crypto.generate_session_key().and_then(|key| {
            let sealed = self.crypto.seal_session_key(public_key, &key)?;
            Ok((key, sealed))
        });
        let (key, sealed_key) = match sealed {
            Ok(sealed) => sealed,
            Err(error) => {
                self.fail_connection(HandshakeError::from(error).into());
                return;
            }
        };
        self.session_key = Some(key);
        self.peer_id = Some(peer_id);

        let delivery = self.config.handshake_delivery;
        if let Err(error) = self.send_frame(&Frame::HandshakeReply { sealed_key }, delivery, 0) {
            self.fail_connection(error);
            return;
        }
        self.state = ConnectionState::HandshakeEnd;
        debug!("sent session key as {}", peer_id);
    }

    fn on_handshake_end(&mut self) {
        if self.state != ConnectionState::HandshakeEnd {
            self.fail_connection(
                HandshakeError::UnexpectedMessage {
                    message: "handshake end",
                    state: self.state,
                }
                .into(),
            );
            return;
        }
        let Some(peer_id) = self.peer_id else {
            self.fail_connection(HandshakeError::ReservedPeerId.into());
            return;
        };
        self.state = ConnectionState::Connected;
        let delivery = self.config.handshake_delivery;
        if let Err(error) = self.send_frame(&Frame::EndHandshake, delivery, 0) {
            self.fail_connection(error);
            return;
        }
        info!("connected to server as {}", peer_id);
        self.incoming_events.push_connection(peer_id);
    }

    // Invokes

    fn invoke(&mut self, ctx: InvokeContext, args: &Args) {
        let mut outbox = Outbox::new();
        let result = match ctx.instance {
            Some(_) => self.identities.invoke_local(&ctx, args, &mut outbox),
            None => self.identities.invoke_global(&ctx, args, &mut outbox),
        };
        match result {
            Ok(()) => {}
            Err(error @ DispatchError::ArityMismatch { .. }) => {
                self.fail_connection(RallyClientError::ProtocolViolation {
                    reason: error.to_string(),
                });
                return;
            }
            Err(error) => {
                warn!("Client Error: {}", error);
                self.incoming_events.push_error(error.into());
            }
        }
        for message in outbox.drain() {
            if let Err(error) = self.send(message) {
                warn!("Client Error: {}", error);
                self.incoming_events.push_error(error);
            }
        }
    }

    // Requests & time sync

    fn on_response(&mut self, request_id: u32, status: ResponseStatus, payload: Vec<u8>) {
        let route = self.request_routes.remove(&request_id).unwrap_or_default();
        let result = match status {
            ResponseStatus::Ok => Ok(payload),
            ResponseStatus::NotFound => Err(RequestError::RouteNotFound { route }),
            ResponseStatus::Rejected => Err(RequestError::Rejected {
                reason: String::from_utf8_lossy(&payload).into_owned(),
            }),
        };
        if let Err(error) = self.requests.resolve(request_id, result) {
            // responses that arrive after their timeout land here
            debug!("{}", error);
        }
    }

    fn on_ntp_query(&mut self, body: &[u8]) {
        let Some(time_sync) = self.time_sync.as_mut() else {
            debug!("no time sync collaborator, dropping time query");
            return;
        };
        let Some(reply) = time_sync.handle(PeerId::SERVER, body) else {
            return;
        };
        if let Err(error) = self.send_frame(&Frame::NtpQuery { body: reply }, DeliveryMode::Unreliable, 0) {
            warn!("Client Error: {}", error);
        }
    }

    /// Sends a time query to the server's time sync collaborator
    pub fn send_time_query(&mut self, body: Vec<u8>) -> Result<(), RallyClientError> {
        self.guard.check();
        self.require_connected()?;
        self.send_frame(&Frame::NtpQuery { body }, DeliveryMode::Unreliable, 0)
    }

    /// Sends a request to the server's `route`. Poll the returned key with
    /// [`Client::receive_response`]
    pub fn request(
        &mut self,
        route: &str,
        payload: Vec<u8>,
    ) -> Result<ResponseReceiveKey, RallyClientError> {
        self.guard.check();
        self.require_connected()?;
        let key = self
            .requests
            .begin(Instant::now(), self.config.request_timeout);
        let request_id = key.request_id();
        let frame = Frame::Request {
            request_id,
            route: route.to_owned(),
            payload,
        };
        if let Err(error) = self.send_frame(&frame, DeliveryMode::ReliableOrdered, 0) {
            // the key is useless to the caller, settle it
            let _ = self
                .requests
                .resolve(request_id, Err(RequestError::Cancelled { request_id }));
            let _ = self.requests.take(&key);
            return Err(error);
        }
        self.request_routes.insert(request_id, route.to_owned());
        Ok(key)
    }

    /// `None` while the request is still waiting
    pub fn receive_response(
        &mut self,
        key: &ResponseReceiveKey,
    ) -> Option<Result<Vec<u8>, RequestError>> {
        self.requests.take(key)
    }

    pub fn pending_requests(&self) -> usize {
        self.requests.waiting_count()
    }

    // Sending

    /// Sends a message composed elsewhere, for instance by a handler's outbox
    pub fn send(&mut self, message: OutboxMessage) -> Result<(), RallyClientError> {
        self.guard.check();
        let peer_id = self.require_connected()?;
        let options = *message.options();
        let frame = message.into_frame(peer_id);
        self.send_frame(&frame, options.delivery, options.channel)
    }

    pub fn send_global_invoke(
        &mut self,
        identity: IdentityId,
        method: MethodId,
        args: Args,
        options: SendOptions,
    ) -> Result<(), RallyClientError> {
        self.send(OutboxMessage::GlobalInvoke {
            identity,
            method,
            args,
            options,
        })
    }

    pub fn send_local_invoke(
        &mut self,
        identity: IdentityId,
        instance: InstanceId,
        method: MethodId,
        args: Args,
        options: SendOptions,
    ) -> Result<(), RallyClientError> {
        self.send(OutboxMessage::LocalInvoke {
            identity,
            instance,
            method,
            args,
            options,
        })
    }

    pub fn send_custom(
        &mut self,
        kind: u8,
        payload: Vec<u8>,
        options: SendOptions,
    ) -> Result<(), RallyClientError> {
        self.send(OutboxMessage::Custom {
            kind,
            payload,
            options,
        })
    }

    // Groups

    /// Asks the server to add this client to `name`. Membership takes effect
    /// when the server's acknowledgement arrives
    pub fn join_group(&mut self, name: &str) -> Result<(), RallyClientError> {
        self.guard.check();
        self.require_connected()?;
        let frame = Frame::JoinGroup {
            name: name.to_owned(),
        };
        self.send_frame(&frame, DeliveryMode::ReliableOrdered, 0)
    }

    pub fn leave_group(&mut self, name: &str, reason: &str) -> Result<(), RallyClientError> {
        self.guard.check();
        self.require_connected()?;
        if !self.is_in_group(name) {
            return Err(RallyClientError::NotAMember {
                name: name.to_owned(),
            });
        }
        let frame = Frame::LeaveGroup {
            name: name.to_owned(),
            reason: reason.to_owned(),
        };
        self.send_frame(&frame, DeliveryMode::ReliableOrdered, 0)
    }

    // Teardown

    /// Closes the connection. Pending requests fail with a cancellation
    pub fn disconnect(&mut self) -> Result<(), RallyClientError> {
        self.guard.check();
        let (Some(sender), Some(addr)) = (self.sender.as_deref(), self.server_addr) else {
            return Err(RallyClientError::NotConnected);
        };
        let result = sender.disconnect(&addr);
        self.teardown();
        Ok(result?)
    }

    fn fail_connection(&mut self, error: RallyClientError) {
        warn!("Client Error: {}", error);
        if let (Some(sender), Some(addr)) = (self.sender.as_deref(), self.server_addr) {
            if let Err(error) = sender.disconnect(&addr) {
                warn!("Client Error: {}", error);
            }
        }
        self.teardown();
        self.incoming_events.push_error(error);
    }

    fn teardown(&mut self) {
        let was_connected = self.state == ConnectionState::Connected;
        self.requests.cancel_all();
        self.request_routes.clear();
        self.groups.clear();
        self.session_key = None;
        self.peer_id = None;
        self.sender = None;
        self.receiver = None;
        self.state = ConnectionState::Disconnected;
        if let Some(addr) = self.server_addr.take() {
            if was_connected {
                self.incoming_events.push_disconnection(addr);
            }
        }
    }

    // Framing

    fn require_connected(&self) -> Result<PeerId, RallyClientError> {
        if self.sender.is_none() {
            return Err(RallyClientError::NotConnected);
        }
        match (self.state, self.peer_id) {
            (ConnectionState::Connected, Some(peer_id)) => Ok(peer_id),
            (state, _) => Err(RallyClientError::HandshakeIncomplete { state }),
        }
    }

    fn send_frame(
        &self,
        frame: &Frame,
        delivery: DeliveryMode,
        channel: SequenceChannel,
    ) -> Result<(), RallyClientError> {
        let (Some(sender), Some(addr)) = (self.sender.as_deref(), self.server_addr) else {
            return Err(RallyClientError::NotConnected);
        };
        let buffer = frame.to_buffer(&self.pool)?;
        if self.config.encrypt_payloads && !frame.message_type().is_handshake() {
            let key = self
                .session_key
                .as_ref()
                .ok_or(RallyClientError::HandshakeIncomplete { state: self.state })?;
            let sealed = seal_frame(self.crypto.as_ref(), key, buffer.as_bytes())?;
            sender.send(&addr, &sealed, delivery, channel)?;
        } else {
            sender.send(&addr, buffer.as_bytes(), delivery, channel)?;
        }
        Ok(())
    }

    fn read_frame(&self, bytes: &[u8]) -> Result<Frame, RallyClientError> {
        let handshake = bytes
            .first()
            .map(|kind| MessageType::from_byte(*kind).is_handshake())
            .unwrap_or(false);
        if self.config.encrypt_payloads && !handshake {
            let key = self
                .session_key
                .as_ref()
                .ok_or(RallyClientError::HandshakeIncomplete { state: self.state })?;
            let plaintext = open_frame(self.crypto.as_ref(), key, bytes)?;
            return Ok(Frame::decode(&plaintext, &self.pool, HostType::Client)?);
        }
        Ok(Frame::decode(bytes, &self.pool, HostType::Client)?)
    }
}
