/// E2E tests for request/response routes, request timeouts and the time
/// sync hook
use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;

use rally_client::{ClientConfig, RallyClientError};
use rally_server::{RouteError, ServerConfig};
use rally_shared::{PeerId, RequestError, TimeSync};
use rally_test::{connect_client, init_logging, start_server, LocalHub};

#[test]
fn registered_routes_answer_requests() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut client, peer) = connect_client(&hub, &mut server, ClientConfig::default());

    server
        .register_route("echo", move |from, payload| {
            assert_eq!(from, peer);
            Ok(payload.to_vec())
        })
        .unwrap();

    let key = client.request("echo", b"ping".to_vec()).unwrap();
    assert!(client.receive_response(&key).is_none());
    assert_eq!(client.pending_requests(), 1);

    server.receive();
    client.receive();
    assert_eq!(client.receive_response(&key), Some(Ok(b"ping".to_vec())));
    assert_eq!(client.pending_requests(), 0);
    // taken once
    assert!(client.receive_response(&key).is_none());
}

#[test]
fn unknown_routes_and_rejections_fail_the_request() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut client, _) = connect_client(&hub, &mut server, ClientConfig::default());
    server
        .register_route("login", |_from, _payload| Err(RouteError::rejected("bad password")))
        .unwrap();

    let missing = client.request("missing", Vec::new()).unwrap();
    let login = client.request("login", Vec::new()).unwrap();
    assert_ne!(missing.request_id(), login.request_id());
    server.receive();
    client.receive();

    assert_eq!(
        client.receive_response(&missing),
        Some(Err(RequestError::RouteNotFound {
            route: "missing".to_owned()
        }))
    );
    assert_eq!(
        client.receive_response(&login),
        Some(Err(RequestError::Rejected {
            reason: "bad password".to_owned()
        }))
    );
}

#[test]
fn duplicate_routes_are_refused() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    server
        .register_route("echo", |_from, payload| Ok(payload.to_vec()))
        .unwrap();
    assert!(server
        .register_route("echo", |_from, _payload| Ok(Vec::new()))
        .is_err());
}

#[test]
fn unanswered_requests_time_out() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let config = ClientConfig {
        request_timeout: Duration::ZERO,
        ..ClientConfig::default()
    };
    let (mut client, _) = connect_client(&hub, &mut server, config);

    let key = client.request("slow", Vec::new()).unwrap();
    client.receive();
    assert_eq!(
        client.receive_response(&key),
        Some(Err(RequestError::Timeout {
            request_id: key.request_id()
        }))
    );

    // the late NotFound response is dropped quietly
    server.receive();
    assert!(client.receive().is_empty());
}

#[test]
fn disconnecting_cancels_pending_requests() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut client, _) = connect_client(&hub, &mut server, ClientConfig::default());

    let key = client.request("anything", Vec::new()).unwrap();
    client.disconnect().unwrap();
    assert_eq!(
        client.receive_response(&key),
        Some(Err(RequestError::Cancelled {
            request_id: key.request_id()
        }))
    );
    assert!(matches!(
        client.request("anything", Vec::new()),
        Err(RallyClientError::NotConnected)
    ));
}

struct Stamp {
    seen: Arc<Mutex<Vec<(PeerId, Vec<u8>)>>>,
    reply: Option<u8>,
}

impl TimeSync for Stamp {
    fn handle(&mut self, from: PeerId, body: &[u8]) -> Option<Vec<u8>> {
        self.seen.lock().push((from, body.to_vec()));
        self.reply.map(|stamp| {
            let mut reply = body.to_vec();
            reply.push(stamp);
            reply
        })
    }
}

#[test]
fn time_queries_reach_the_time_sync_collaborators() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut client, peer) = connect_client(&hub, &mut server, ClientConfig::default());

    let server_seen = Arc::default();
    server.set_time_sync(Box::new(Stamp {
        seen: Arc::clone(&server_seen),
        reply: Some(9),
    }));
    let client_seen = Arc::default();
    client.set_time_sync(Box::new(Stamp {
        seen: Arc::clone(&client_seen),
        reply: None,
    }));

    client.send_time_query(vec![1, 2]).unwrap();
    server.receive();
    client.receive();

    assert_eq!(*server_seen.lock(), vec![(peer, vec![1, 2])]);
    assert_eq!(*client_seen.lock(), vec![(PeerId::SERVER, vec![1, 2, 9])]);
}
