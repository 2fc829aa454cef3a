/// Assert that the server and client agree that the client is connected
#[macro_export]
macro_rules! assert_connected {
    ($server:expr, $client:expr) => {
        assert!($client.is_client_active(), "client should be connected");
        let peer_id = $client.peer_id().expect("connected client has a peer id");
        assert!(
            $server
                .peer(&peer_id)
                .map(|peer| peer.is_connected())
                .unwrap_or(false),
            "server should list {} as connected",
            peer_id
        );
    };
}

/// Assert that the server's and the peer's group tables both record the
/// membership
#[macro_export]
macro_rules! assert_member {
    ($server:expr, $peer:expr, $name:expr) => {
        let group = $server
            .group_by_name($name)
            .unwrap_or_else(|| panic!("group '{}' should exist", $name));
        assert!(group.has_member(&$peer), "{} should be in '{}'", $peer, $name);
        assert!(
            $server
                .peer(&$peer)
                .map(|peer| peer.is_in_group(&group.id()))
                .unwrap_or(false),
            "{} should list '{}' among its groups",
            $peer,
            $name
        );
    };
}
