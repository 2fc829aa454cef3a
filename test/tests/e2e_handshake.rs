/// E2E tests for the connection handshake and teardown, driven over the
/// in-memory hub
use rally_client::{
    Client, ClientConfig, ConnectEvent as ClientConnectEvent, ConnectionState,
    DisconnectEvent as ClientDisconnectEvent,
};
use rally_server::{
    ConnectEvent, DisconnectEvent, ErrorEvent, RallyServerError, ServerConfig,
};
use rally_shared::{PeerId, SendOptions, Target};
use rally_test::{assert_connected, connect_client, init_logging, start_server, LocalHub};

#[test]
fn handshake_activates_client_and_fires_connect_once() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());

    let mut client = Client::new(ClientConfig::default());
    client
        .connect(hub.client_socket(), hub.server_addr())
        .unwrap();
    assert_eq!(client.connection_state(), ConnectionState::Connecting);

    // registers the peer and sends the offer
    let events = server.receive();
    assert!(events.is_empty());
    assert_eq!(server.peer_count(), 1);
    assert!(!client.is_client_active());

    // seals a session key against the offered public key
    let events = client.receive();
    assert!(events.is_empty());
    assert_eq!(client.connection_state(), ConnectionState::HandshakeEnd);

    // opens the session key and confirms
    server.receive();
    let mut events = client.receive();
    assert!(client.is_client_active());
    let connected: Vec<PeerId> = events.read::<ClientConnectEvent>().collect();
    assert_eq!(connected.len(), 1);

    let mut events = server.receive();
    let accepted: Vec<PeerId> = events.read::<ConnectEvent>().collect();
    assert_eq!(accepted, connected);
    assert_connected!(server, client);

    // nothing more to say, no second connect on either side
    assert!(!client.receive().has::<ClientConnectEvent>());
    assert!(!server.receive().has::<ConnectEvent>());
}

#[test]
fn every_peer_gets_a_distinct_non_server_id() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());

    let mut ids = Vec::new();
    let mut clients = Vec::new();
    for _ in 0..4 {
        let (client, peer) = connect_client(&hub, &mut server, ClientConfig::default());
        assert_eq!(client.peer_id(), Some(peer));
        ids.push(peer);
        clients.push(client);
    }

    assert!(ids.iter().all(|id| !id.is_server()));
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());
    assert_eq!(server.peer_ids(), unique);
}

#[test]
fn client_disconnect_is_reported_on_both_ends() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut client, peer) = connect_client(&hub, &mut server, ClientConfig::default());

    client.disconnect().unwrap();
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    assert!(client.peer_id().is_none());
    assert_eq!(client.receive().read::<ClientDisconnectEvent>().count(), 1);

    let mut events = server.receive();
    let gone: Vec<PeerId> = events
        .read::<DisconnectEvent>()
        .map(|(peer, _addr)| peer)
        .collect();
    assert_eq!(gone, vec![peer]);
    assert!(server.peer(&peer).is_none());
}

#[test]
fn server_disconnect_is_reported_to_the_client() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut client, peer) = connect_client(&hub, &mut server, ClientConfig::default());

    server.disconnect(peer).unwrap();
    assert!(server.receive().has::<DisconnectEvent>());

    let mut events = client.receive();
    assert_eq!(
        events.read::<ClientDisconnectEvent>().collect::<Vec<_>>(),
        vec![hub.server_addr()]
    );
    assert!(!client.is_client_active());
    assert!(server.disconnect(peer).is_err());
}

#[test]
fn mismatched_encryption_is_a_protocol_violation() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let plaintext = ClientConfig {
        encrypt_payloads: false,
        ..ClientConfig::default()
    };
    let (mut client, peer) = connect_client(&hub, &mut server, plaintext);

    client
        .send_custom(40, vec![7; 32], SendOptions::to(Target::All))
        .unwrap();

    let mut events = server.receive();
    let errors: Vec<RallyServerError> = events.read::<ErrorEvent>().collect();
    assert!(matches!(
        errors.as_slice(),
        [RallyServerError::ProtocolViolation { peer: offender, .. }] if *offender == peer
    ));
    assert!(events.has::<DisconnectEvent>());
    assert!(server.peer(&peer).is_none());

    client.receive();
    assert!(!client.is_client_active());
}

#[test]
fn stopping_the_server_releases_everything() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut first, _) = connect_client(&hub, &mut server, ClientConfig::default());
    let (mut second, _) = connect_client(&hub, &mut server, ClientConfig::default());
    first.join_group("lobby").unwrap();
    server.receive();

    server.stop();
    assert!(!server.is_listening());
    assert_eq!(server.peer_count(), 0);
    assert_eq!(server.group_count(), 0);

    first.receive();
    second.receive();
    assert!(!first.is_client_active());
    assert!(!second.is_client_active());
    assert_eq!(hub.connected_clients(), 0);
}
