/// E2E tests for the replay cache: late joiners receive retained messages
use rally_client::{Client, ClientConfig, CustomMessageEvent, GroupJoinEvent};
use rally_server::{
    CacheError, CacheScope, ErrorEvent, RallyServerError, RouterError, Server, ServerConfig,
    TargetError,
};
use rally_shared::{CacheMode, GroupId, SendOptions, Target};
use rally_test::{connect_client, init_logging, settle, start_server, LocalHub};

const SPAWN: u8 = 50;

fn payloads(client: &mut Client) -> Vec<Vec<u8>> {
    client
        .receive()
        .read::<CustomMessageEvent>()
        .map(|message| message.payload)
        .collect()
}

fn global_entries(server: &Server) -> usize {
    server
        .cache()
        .table(CacheScope::Global)
        .map(|table| table.len())
        .unwrap_or(0)
}

#[test]
fn auto_destroy_entry_is_replayed_then_dropped_with_its_origin() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut x, peer_x) = connect_client(&hub, &mut server, ClientConfig::default());

    let mode = CacheMode::GLOBAL | CacheMode::NEW | CacheMode::AUTO_DESTROY;
    x.send_custom(SPAWN, b"spawn".to_vec(), SendOptions::to(Target::All).cached(5, mode))
        .unwrap();
    server.receive();
    assert_eq!(global_entries(&server), 1);

    // replayed as part of Y's handshake
    let (mut y, peer_y) = connect_client(&hub, &mut server, ClientConfig::default());
    let mut events = y.receive();
    let replayed: Vec<_> = events.read::<CustomMessageEvent>().collect();
    assert_eq!(replayed.len(), 1);
    assert_eq!(replayed[0].sender, peer_x);
    assert_eq!(replayed[0].kind, SPAWN);
    assert_eq!(replayed[0].payload, b"spawn".to_vec());

    x.disconnect().unwrap();
    server.receive();
    assert_eq!(global_entries(&server), 0);
    assert_eq!(
        server
            .replay_cache(peer_y, 5, mode, GroupId::NONE, true)
            .unwrap(),
        0
    );

    let (mut z, _) = connect_client(&hub, &mut server, ClientConfig::default());
    assert!(payloads(&mut z).is_empty());
}

#[test]
fn overwrite_keeps_only_the_latest_entry() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut x, _) = connect_client(&hub, &mut server, ClientConfig::default());

    let options = SendOptions::to(Target::AllExceptSelf)
        .cached(7, CacheMode::GLOBAL | CacheMode::OVERWRITE);
    x.send_custom(SPAWN, vec![1], options).unwrap();
    x.send_custom(SPAWN, vec![2], options).unwrap();
    server.receive();
    assert_eq!(global_entries(&server), 1);

    let (mut y, _) = connect_client(&hub, &mut server, ClientConfig::default());
    assert_eq!(payloads(&mut y), vec![vec![2]]);
}

#[test]
fn new_mode_appends_in_send_order() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut x, _) = connect_client(&hub, &mut server, ClientConfig::default());

    let options = SendOptions::to(Target::AllExceptSelf).cached(7, CacheMode::GLOBAL | CacheMode::NEW);
    x.send_custom(SPAWN, vec![1], options).unwrap();
    x.send_custom(SPAWN, vec![2], options).unwrap();
    server.receive();
    assert_eq!(global_entries(&server), 2);

    let (mut y, _) = connect_client(&hub, &mut server, ClientConfig::default());
    assert_eq!(payloads(&mut y), vec![vec![1], vec![2]]);
}

#[test]
fn group_cache_replays_to_joiners_and_dies_with_the_group() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut x, _) = connect_client(&hub, &mut server, ClientConfig::default());
    let (mut y, _) = connect_client(&hub, &mut server, ClientConfig::default());

    x.join_group("arena").unwrap();
    settle(&mut server, &mut [&mut x, &mut y]);

    let arena = GroupId::from_name("arena");
    let options = SendOptions::to(Target::GroupMembers)
        .group(arena)
        .cached(9, CacheMode::GROUP | CacheMode::NEW);
    x.send_custom(SPAWN, b"flag".to_vec(), options).unwrap();
    server.receive();
    assert!(payloads(&mut y).is_empty());

    y.join_group("arena").unwrap();
    server.receive();
    let mut events = y.receive();
    assert_eq!(events.read::<GroupJoinEvent>().count(), 1);
    let replayed: Vec<_> = events.read::<CustomMessageEvent>().collect();
    assert_eq!(replayed.len(), 1);
    assert_eq!(replayed[0].payload, b"flag".to_vec());

    x.leave_group("arena", "done").unwrap();
    y.leave_group("arena", "done").unwrap();
    settle(&mut server, &mut [&mut x, &mut y]);
    assert!(server.group(&arena).is_none());
    assert!(server.cache().table(CacheScope::Group(arena)).is_none());
}

#[test]
fn replay_on_connect_can_be_switched_off() {
    init_logging();
    let hub = LocalHub::new();
    let mut config = ServerConfig::default();
    config.router.replay_global_cache_on_connect = false;
    let mut server = start_server(&hub, config);
    let (mut x, _) = connect_client(&hub, &mut server, ClientConfig::default());

    let mode = CacheMode::GLOBAL | CacheMode::NEW;
    x.send_custom(SPAWN, vec![3], SendOptions::to(Target::AllExceptSelf).cached(4, mode))
        .unwrap();
    server.receive();

    let (mut y, peer_y) = connect_client(&hub, &mut server, ClientConfig::default());
    assert!(payloads(&mut y).is_empty());

    let sent = server
        .replay_cache(peer_y, 4, mode, GroupId::NONE, false)
        .unwrap();
    assert_eq!(sent, 1);
    assert_eq!(payloads(&mut y), vec![vec![3]]);
}

#[test]
fn entries_can_be_removed_explicitly() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut x, _) = connect_client(&hub, &mut server, ClientConfig::default());

    let mode = CacheMode::GLOBAL | CacheMode::NEW;
    x.send_custom(SPAWN, vec![1], SendOptions::to(Target::All).cached(11, mode))
        .unwrap();
    server.receive();

    assert_eq!(server.remove_cache(11, mode, GroupId::NONE), 1);
    assert_eq!(global_entries(&server), 0);
    assert_eq!(server.remove_cache(11, mode, GroupId::NONE), 0);
}

#[test]
fn invalid_cache_modes_are_refused() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut x, _) = connect_client(&hub, &mut server, ClientConfig::default());

    let ambiguous = CacheMode::GLOBAL | CacheMode::NEW | CacheMode::OVERWRITE;
    x.send_custom(SPAWN, vec![1], SendOptions::to(Target::All).cached(3, ambiguous))
        .unwrap();

    let mut events = server.receive();
    let errors: Vec<_> = events.read::<ErrorEvent>().collect();
    assert!(matches!(
        errors.as_slice(),
        [RallyServerError::Router(RouterError::Cache(CacheError::InvalidMode(_)))]
    ));
    assert_eq!(global_entries(&server), 0);
    assert!(payloads(&mut x).is_empty());
}

#[test]
fn non_members_cannot_cache_into_a_group() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut a, peer_a) = connect_client(&hub, &mut server, ClientConfig::default());
    let (mut b, _) = connect_client(&hub, &mut server, ClientConfig::default());

    b.join_group("vault").unwrap();
    settle(&mut server, &mut [&mut a, &mut b]);

    let vault = GroupId::from_name("vault");
    let options = SendOptions::to(Target::All)
        .group(vault)
        .cached(3, CacheMode::GROUP | CacheMode::NEW);
    a.send_custom(SPAWN, b"evil".to_vec(), options).unwrap();

    let mut events = server.receive();
    let errors: Vec<_> = events.read::<ErrorEvent>().collect();
    assert!(matches!(
        errors.as_slice(),
        [RallyServerError::Router(RouterError::Target(TargetError::NotAMember { sender, group }))]
            if *sender == peer_a && *group == vault
    ));
    assert!(server
        .cache()
        .table(CacheScope::Group(vault))
        .map(|table| table.is_empty())
        .unwrap_or(true));
    assert!(payloads(&mut b).is_empty());

    let (mut c, _) = connect_client(&hub, &mut server, ClientConfig::default());
    c.join_group("vault").unwrap();
    server.receive();
    let mut events = c.receive();
    assert_eq!(events.read::<GroupJoinEvent>().count(), 1);
    assert_eq!(events.read::<CustomMessageEvent>().count(), 0);
}

#[test]
fn caching_into_a_missing_group_is_refused() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut a, _) = connect_client(&hub, &mut server, ClientConfig::default());

    let ghost = GroupId::from_name("ghost");
    let options = SendOptions::to(Target::All)
        .group(ghost)
        .cached(3, CacheMode::GROUP | CacheMode::OVERWRITE);
    a.send_custom(SPAWN, vec![1], options).unwrap();

    let mut events = server.receive();
    let errors: Vec<_> = events.read::<ErrorEvent>().collect();
    assert!(matches!(
        errors.as_slice(),
        [RallyServerError::Router(RouterError::Target(TargetError::UnknownGroup { group }))]
            if *group == ghost
    ));
    assert!(server.group(&ghost).is_none());
    assert!(server.cache().table(CacheScope::Group(ghost)).is_none());
    assert!(payloads(&mut a).is_empty());
}

#[test]
fn cross_group_caching_can_be_allowed() {
    init_logging();
    let hub = LocalHub::new();
    let mut config = ServerConfig::default();
    config.router.allow_cross_group = true;
    let mut server = start_server(&hub, config);
    let (mut a, _) = connect_client(&hub, &mut server, ClientConfig::default());
    let (mut b, _) = connect_client(&hub, &mut server, ClientConfig::default());

    b.join_group("vault").unwrap();
    settle(&mut server, &mut [&mut a, &mut b]);

    let vault = GroupId::from_name("vault");
    let options = SendOptions::to(Target::All)
        .group(vault)
        .cached(3, CacheMode::GROUP | CacheMode::NEW);
    a.send_custom(SPAWN, b"note".to_vec(), options).unwrap();

    let mut events = server.receive();
    assert!(!events.has::<ErrorEvent>());
    assert_eq!(
        server
            .cache()
            .table(CacheScope::Group(vault))
            .map(|table| table.len()),
        Some(1)
    );
}
