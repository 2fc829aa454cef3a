use rally_client::{Client, ClientConfig, ConnectEvent as ClientConnectEvent};
use rally_server::{ConnectEvent, Server, ServerConfig};
use rally_shared::PeerId;

use crate::LocalHub;

/// Rounds needed for any single message to reach its destination and for
/// the destination's replies to come back
const SETTLE_ROUNDS: usize = 4;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A server already listening on `hub`
pub fn start_server(hub: &LocalHub, config: ServerConfig) -> Server {
    let mut server = match Server::new(config) {
        Ok(server) => server,
        Err(error) => panic!("server failed to start: {}", error),
    };
    server.listen(hub.server_socket());
    server
}

/// Connects a new client and drives the handshake to completion
pub fn connect_client(hub: &LocalHub, server: &mut Server, config: ClientConfig) -> (Client, PeerId) {
    let mut client = Client::new(config);
    if let Err(error) = client.connect(hub.client_socket(), hub.server_addr()) {
        panic!("client failed to connect: {}", error);
    }

    // offer, sealed key, end, acknowledgement
    server.receive();
    client.receive();
    server.receive();
    let mut client_events = client.receive();
    let mut server_events = server.receive();

    let client_side: Vec<PeerId> = client_events.read::<ClientConnectEvent>().collect();
    let server_side: Vec<PeerId> = server_events.read::<ConnectEvent>().collect();
    assert_eq!(client_side.len(), 1, "client should connect exactly once");
    assert_eq!(client_side, server_side, "both ends should agree on the peer id");
    (client, client_side[0])
}

/// Drives every endpoint until queued traffic has been handled, discarding
/// the events
pub fn settle(server: &mut Server, clients: &mut [&mut Client]) {
    for _ in 0..SETTLE_ROUNDS {
        server.receive();
        for client in clients.iter_mut() {
            client.receive();
        }
    }
}

/// Configs with payload encryption off on both ends
pub fn plaintext_configs() -> (ServerConfig, ClientConfig) {
    let mut server = ServerConfig::default();
    server.router.encrypt_payloads = false;
    let client = ClientConfig {
        encrypt_payloads: false,
        ..ClientConfig::default()
    };
    (server, client)
}

/// Sorted members of the group called `name`, empty when it does not exist
pub fn lobby_members(server: &Server, name: &str) -> Vec<PeerId> {
    let mut members: Vec<PeerId> = server
        .group_by_name(name)
        .map(|group| group.members().copied().collect())
        .unwrap_or_default();
    members.sort();
    members
}
