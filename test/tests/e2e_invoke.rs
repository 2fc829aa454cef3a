/// E2E tests for handler dispatch: server-targeted invokes, relayed invokes,
/// arity enforcement and ownership checks
use std::sync::Arc;

use parking_lot::Mutex;

use rally_client::{
    ClientConfig, CustomMessageEvent, DisconnectEvent as ClientDisconnectEvent,
    ErrorEvent as ClientErrorEvent, RallyClientError,
};
use rally_server::{DisconnectEvent, ErrorEvent, RallyServerError, ServerConfig};
use rally_shared::{
    args, Args, DispatchError, HandlerError, PeerId, SendOptions, Target,
};
use rally_test::{connect_client, init_logging, settle, start_server, LocalHub};

const LOBBY_SERVICE: i32 = 1;
const PLAYER: i32 = 2;
const SAY: u8 = 10;
const MOVE: u8 = 11;
const REPLY: u8 = 31;

type Calls = Arc<Mutex<Vec<(PeerId, Args)>>>;

fn recorder(calls: &Calls) -> impl FnMut(&rally_shared::InvokeContext, &Args, &mut rally_shared::Outbox) -> Result<(), HandlerError> + Send + 'static {
    let calls = calls.clone();
    move |ctx, args, _outbox| {
        calls.lock().push((ctx.sender, args.clone()));
        Ok(())
    }
}

#[test]
fn server_handler_receives_the_exact_arguments() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut client, peer) = connect_client(&hub, &mut server, ClientConfig::default());

    let seen: Arc<Mutex<Vec<(PeerId, i32, String)>>> = Arc::default();
    let log = seen.clone();
    let identities = server.identities_mut();
    identities
        .register_identity(LOBBY_SERVICE, PeerId::SERVER)
        .unwrap();
    identities
        .register_global(LOBBY_SERVICE, SAY, 2, false, move |ctx, args, outbox| {
            let count: i32 = args.get(0)?;
            let text: String = args.get(1)?;
            log.lock().push((ctx.sender, count, text.clone()));
            outbox.custom(REPLY, text.into_bytes(), SendOptions::to(Target::All));
            Ok(())
        })
        .unwrap();

    client
        .send_global_invoke(
            LOBBY_SERVICE,
            SAY,
            args![5i32, "hello"],
            SendOptions::to(Target::Server),
        )
        .unwrap();
    assert!(server.receive().is_empty());
    assert_eq!(*seen.lock(), vec![(peer, 5, "hello".to_owned())]);

    let mut events = client.receive();
    let replies: Vec<_> = events.read::<CustomMessageEvent>().collect();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].sender, PeerId::SERVER);
    assert_eq!(replies[0].kind, REPLY);
    assert_eq!(replies[0].payload, b"hello".to_vec());
}

#[test]
fn handler_failures_are_reported_without_disconnecting() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut client, peer) = connect_client(&hub, &mut server, ClientConfig::default());

    let identities = server.identities_mut();
    identities
        .register_identity(LOBBY_SERVICE, PeerId::SERVER)
        .unwrap();
    identities
        .register_global(LOBBY_SERVICE, SAY, 1, false, |_ctx, args, _outbox| {
            let _: String = args.get(0)?;
            Ok(())
        })
        .unwrap();

    // right arity, wrong type
    client
        .send_global_invoke(LOBBY_SERVICE, SAY, args![3i32], SendOptions::to(Target::Server))
        .unwrap();
    let mut events = server.receive();
    let errors: Vec<_> = events.read::<ErrorEvent>().collect();
    assert!(matches!(
        errors.as_slice(),
        [RallyServerError::Dispatch(DispatchError::Handler {
            source: HandlerError::ArgumentType { index: 0, .. },
            ..
        })]
    ));
    assert!(server.peer(&peer).is_some());
    assert!(client.is_client_active());
}

#[test]
fn arity_mismatch_disconnects_the_caller() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut client, peer) = connect_client(&hub, &mut server, ClientConfig::default());

    let calls = Calls::default();
    let identities = server.identities_mut();
    identities
        .register_identity(LOBBY_SERVICE, PeerId::SERVER)
        .unwrap();
    identities
        .register_global(LOBBY_SERVICE, SAY, 2, false, recorder(&calls))
        .unwrap();

    client
        .send_global_invoke(LOBBY_SERVICE, SAY, args![1i32], SendOptions::to(Target::Server))
        .unwrap();

    let mut events = server.receive();
    assert!(calls.lock().is_empty());
    let errors: Vec<_> = events.read::<ErrorEvent>().collect();
    assert!(matches!(
        errors.as_slice(),
        [RallyServerError::ProtocolViolation { .. }]
    ));
    assert_eq!(events.read::<DisconnectEvent>().count(), 1);
    assert!(server.peer(&peer).is_none());

    assert!(client.receive().has::<ClientDisconnectEvent>());
    assert!(!client.is_client_active());
}

#[test]
fn relayed_invokes_reach_every_target_handler() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut a, peer_a) = connect_client(&hub, &mut server, ClientConfig::default());
    let (mut b, _) = connect_client(&hub, &mut server, ClientConfig::default());
    let (mut c, _) = connect_client(&hub, &mut server, ClientConfig::default());

    let calls = Calls::default();
    for client in [&mut b, &mut c] {
        let identities = client.identities_mut();
        identities.register_identity(PLAYER, peer_a).unwrap();
        identities
            .register_local(PLAYER, 4, MOVE, 2, true, recorder(&calls))
            .unwrap();
    }

    a.send_local_invoke(
        PLAYER,
        4,
        MOVE,
        args![1.5f32, -2.0f32],
        SendOptions::to(Target::AllExceptSelf),
    )
    .unwrap();
    settle(&mut server, &mut [&mut a, &mut b, &mut c]);

    let calls = calls.lock();
    assert_eq!(calls.len(), 2);
    for (sender, args) in calls.iter() {
        assert_eq!(*sender, peer_a);
        assert_eq!(args.get::<f32>(0).unwrap(), 1.5);
        assert_eq!(args.get::<f32>(1).unwrap(), -2.0);
    }
}

#[test]
fn ownership_is_checked_before_relaying() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut a, peer_a) = connect_client(&hub, &mut server, ClientConfig::default());
    let (mut b, peer_b) = connect_client(&hub, &mut server, ClientConfig::default());

    // the server only tracks ownership, it has no handler to run
    let identities = server.identities_mut();
    identities.register_identity(PLAYER, peer_a).unwrap();
    identities
        .register_global(PLAYER, MOVE, 0, true, |_ctx, _args, _outbox| Ok(()))
        .unwrap();

    let calls = Calls::default();
    let identities = a.identities_mut();
    identities.register_identity(PLAYER, peer_a).unwrap();
    identities
        .register_global(PLAYER, MOVE, 0, true, recorder(&calls))
        .unwrap();

    b.send_global_invoke(PLAYER, MOVE, Args::new(), SendOptions::to(Target::All))
        .unwrap();
    let mut events = server.receive();
    let errors: Vec<_> = events.read::<ErrorEvent>().collect();
    assert!(matches!(
        errors.as_slice(),
        [RallyServerError::Dispatch(DispatchError::OwnershipViolation { caller, .. })]
            if *caller == peer_b
    ));
    a.receive();
    assert!(calls.lock().is_empty());

    a.send_global_invoke(PLAYER, MOVE, Args::new(), SendOptions::to(Target::All))
        .unwrap();
    settle(&mut server, &mut [&mut a, &mut b]);
    assert_eq!(calls.lock().len(), 1);
}

#[test]
fn unknown_identities_on_the_client_are_reported() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut a, _) = connect_client(&hub, &mut server, ClientConfig::default());
    let (mut b, _) = connect_client(&hub, &mut server, ClientConfig::default());

    a.send_global_invoke(77, 1, Args::new(), SendOptions::to(Target::AllExceptSelf))
        .unwrap();
    server.receive();

    let mut events = b.receive();
    let errors: Vec<_> = events.read::<ClientErrorEvent>().collect();
    assert!(matches!(
        errors.as_slice(),
        [RallyClientError::Dispatch(DispatchError::UnknownIdentity { identity: 77 })]
    ));
    assert!(b.is_client_active());
}
