/// E2E tests for group membership and group-scoped fan-out
use rally_client::{
    ClientConfig, CustomMessage, CustomMessageEvent, GroupJoinEvent, GroupLeaveEvent,
};
use rally_server::{
    ErrorEvent, GroupJoinEvent as ServerGroupJoinEvent, GroupLeaveEvent as ServerGroupLeaveEvent,
    RallyServerError, RouterError, ServerConfig, TargetError,
};
use rally_shared::{GroupId, OutboxMessage, PeerId, SendOptions, Target};
use rally_test::{
    assert_member, connect_client, init_logging, lobby_members, settle, start_server, LocalHub,
};

const CHAT: u8 = 20;

fn customs(events: &mut rally_client::Events) -> Vec<CustomMessage> {
    events.read::<CustomMessageEvent>().collect()
}

#[test]
fn join_is_acknowledged_and_recorded_on_both_ends() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut client, peer) = connect_client(&hub, &mut server, ClientConfig::default());

    client.join_group("lobby").unwrap();
    assert!(!client.is_in_group("lobby"));

    let mut events = server.receive();
    let joins: Vec<_> = events.read::<ServerGroupJoinEvent>().collect();
    assert_eq!(joins.len(), 1);
    assert_eq!(joins[0].peer, peer);
    assert_eq!(joins[0].group_id, GroupId::from_name("lobby"));
    assert_member!(server, peer, "lobby");

    let mut events = client.receive();
    assert_eq!(events.read::<GroupJoinEvent>().count(), 1);
    assert!(client.is_in_group("lobby"));
}

#[test]
fn joining_twice_is_reported_and_changes_nothing() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut client, peer) = connect_client(&hub, &mut server, ClientConfig::default());

    client.join_group("lobby").unwrap();
    settle(&mut server, &mut [&mut client]);
    client.join_group("lobby").unwrap();

    let mut events = server.receive();
    let errors: Vec<_> = events.read::<ErrorEvent>().collect();
    assert!(matches!(errors.as_slice(), [RallyServerError::Join(_)]));
    assert_eq!(lobby_members(&server, "lobby"), vec![peer]);
}

#[test]
fn group_members_except_self_reaches_only_other_members() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut a, peer_a) = connect_client(&hub, &mut server, ClientConfig::default());
    let (mut b, peer_b) = connect_client(&hub, &mut server, ClientConfig::default());
    let (mut c, _peer_c) = connect_client(&hub, &mut server, ClientConfig::default());

    a.join_group("lobby").unwrap();
    b.join_group("lobby").unwrap();
    settle(&mut server, &mut [&mut a, &mut b, &mut c]);
    assert_eq!(lobby_members(&server, "lobby"), vec![peer_a, peer_b]);

    // sent by the server on A's behalf
    let options = SendOptions::to(Target::GroupMembersExceptSelf).group(GroupId::from_name("lobby"));
    let recipients = server
        .send_as(
            peer_a,
            OutboxMessage::Custom {
                kind: CHAT,
                payload: b"hello".to_vec(),
                options,
            },
        )
        .unwrap();
    assert_eq!(recipients, vec![peer_b]);

    assert!(customs(&mut a.receive()).is_empty());
    assert!(customs(&mut c.receive()).is_empty());
    let received = customs(&mut b.receive());
    assert_eq!(
        received,
        vec![CustomMessage {
            sender: peer_a,
            kind: CHAT,
            payload: b"hello".to_vec(),
        }]
    );

    // and sent by A itself
    a.send_custom(CHAT, b"again".to_vec(), options).unwrap();
    server.receive();
    assert!(customs(&mut a.receive()).is_empty());
    assert!(customs(&mut c.receive()).is_empty());
    assert_eq!(customs(&mut b.receive()).len(), 1);
}

#[test]
fn non_group_members_targets_peers_outside_every_group() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut a, _) = connect_client(&hub, &mut server, ClientConfig::default());
    let (mut b, _) = connect_client(&hub, &mut server, ClientConfig::default());
    let (mut c, peer_c) = connect_client(&hub, &mut server, ClientConfig::default());

    a.join_group("red").unwrap();
    b.join_group("blue").unwrap();
    settle(&mut server, &mut [&mut a, &mut b, &mut c]);

    let recipients = server
        .send_custom(CHAT, Vec::new(), SendOptions::to(Target::NonGroupMembers))
        .unwrap();
    assert_eq!(recipients, vec![peer_c]);
}

#[test]
fn group_zero_is_refused_unless_allowed() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut a, _) = connect_client(&hub, &mut server, ClientConfig::default());
    a.join_group("lobby").unwrap();
    settle(&mut server, &mut [&mut a]);

    a.send_custom(CHAT, Vec::new(), SendOptions::to(Target::GroupMembers))
        .unwrap();
    let mut events = server.receive();
    let errors: Vec<_> = events.read::<ErrorEvent>().collect();
    assert!(matches!(
        errors.as_slice(),
        [RallyServerError::Router(RouterError::ZeroGroup { .. })]
    ));
    assert!(customs(&mut a.receive()).is_empty());
}

#[test]
fn group_zero_means_every_group_of_the_sender_when_allowed() {
    init_logging();
    let hub = LocalHub::new();
    let mut config = ServerConfig::default();
    config.router.allow_zero_group = true;
    let mut server = start_server(&hub, config);
    let (mut a, _) = connect_client(&hub, &mut server, ClientConfig::default());
    let (mut b, peer_b) = connect_client(&hub, &mut server, ClientConfig::default());
    let (mut c, peer_c) = connect_client(&hub, &mut server, ClientConfig::default());

    a.join_group("red").unwrap();
    a.join_group("blue").unwrap();
    b.join_group("red").unwrap();
    c.join_group("blue").unwrap();
    settle(&mut server, &mut [&mut a, &mut b, &mut c]);

    let peer_a = a.peer_id().unwrap();
    let recipients = server
        .send_as(
            peer_a,
            OutboxMessage::Custom {
                kind: CHAT,
                payload: Vec::new(),
                options: SendOptions::to(Target::GroupMembersExceptSelf),
            },
        )
        .unwrap();
    assert_eq!(recipients, vec![peer_b, peer_c]);
}

#[test]
fn sending_to_a_foreign_group_is_refused() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut a, peer_a) = connect_client(&hub, &mut server, ClientConfig::default());
    let (mut b, _) = connect_client(&hub, &mut server, ClientConfig::default());
    b.join_group("vault").unwrap();
    settle(&mut server, &mut [&mut a, &mut b]);

    let result = server.send_as(
        peer_a,
        OutboxMessage::Custom {
            kind: CHAT,
            payload: Vec::new(),
            options: SendOptions::to(Target::GroupMembers).group(GroupId::from_name("vault")),
        },
    );
    assert!(matches!(
        result,
        Err(RallyServerError::Router(RouterError::Target(
            TargetError::NotAMember { .. }
        )))
    ));

    // the server itself may address any group
    let recipients = server
        .send_custom(
            CHAT,
            Vec::new(),
            SendOptions::to(Target::GroupMembers).group(GroupId::from_name("vault")),
        )
        .unwrap();
    assert_eq!(recipients.len(), 1);
}

#[test]
fn leaving_the_last_member_destroys_the_group() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut a, peer_a) = connect_client(&hub, &mut server, ClientConfig::default());
    a.join_group("lobby").unwrap();
    settle(&mut server, &mut [&mut a]);

    a.leave_group("lobby", "done").unwrap();
    let mut events = server.receive();
    let leaves: Vec<_> = events.read::<ServerGroupLeaveEvent>().collect();
    assert_eq!(leaves.len(), 1);
    assert_eq!(leaves[0].peer, peer_a);
    assert_eq!(leaves[0].reason, "done");
    assert!(leaves[0].destroyed);
    assert!(server.group_by_name("lobby").is_none());
    assert_eq!(server.peer(&peer_a).unwrap().group_count(), 0);

    let mut events = a.receive();
    let leaves: Vec<_> = events.read::<GroupLeaveEvent>().collect();
    assert_eq!(leaves.len(), 1);
    assert!(!a.is_in_group("lobby"));
    assert!(a.leave_group("lobby", "again").is_err());
}

#[test]
fn persistent_groups_survive_emptying() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let hall = server.create_group("hall", false);
    let (mut a, _) = connect_client(&hub, &mut server, ClientConfig::default());

    a.join_group("hall").unwrap();
    settle(&mut server, &mut [&mut a]);
    a.leave_group("hall", "bye").unwrap();
    settle(&mut server, &mut [&mut a]);

    let group = server.group(&hall).unwrap();
    assert!(group.is_empty());
}

#[test]
fn disconnecting_removes_the_peer_from_every_group() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut a, peer_a) = connect_client(&hub, &mut server, ClientConfig::default());
    let (mut b, peer_b) = connect_client(&hub, &mut server, ClientConfig::default());
    a.join_group("red").unwrap();
    a.join_group("blue").unwrap();
    b.join_group("red").unwrap();
    settle(&mut server, &mut [&mut a, &mut b]);

    a.disconnect().unwrap();
    let mut events = server.receive();
    let leaves: Vec<_> = events.read::<ServerGroupLeaveEvent>().collect();
    assert_eq!(leaves.len(), 2);
    assert!(leaves.iter().all(|leave| leave.peer == peer_a));

    assert_eq!(lobby_members(&server, "red"), vec![peer_b]);
    assert!(server.group_by_name("blue").is_none());
    assert!(server.peer(&peer_a).is_none());
}

#[test]
fn server_can_move_peers_between_groups() {
    init_logging();
    let hub = LocalHub::new();
    let mut server = start_server(&hub, ServerConfig::default());
    let (mut a, peer_a) = connect_client(&hub, &mut server, ClientConfig::default());

    server.join_group(peer_a, "red").unwrap();
    a.receive();
    assert!(a.is_in_group("red"));

    server.leave_group(peer_a, "red", "moved").unwrap();
    server.join_group(peer_a, "blue").unwrap();
    a.receive();
    assert!(!a.is_in_group("red"));
    assert!(a.is_in_group("blue"));
    assert_member!(server, peer_a, "blue");

    assert!(matches!(
        server.join_group(PeerId::new(999), "blue"),
        Err(RallyServerError::Join(_))
    ));
}
