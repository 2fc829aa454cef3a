//! # Rally Server
//! A server that authenticates peers with a key-exchange handshake, tracks
//! named groups, relays invocations and custom messages with targeted
//! fan-out, and replays cached messages to peers that join late.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

pub mod shared {
    pub use rally_shared::{
        args, handshake::HandshakeCrypto, transport, Arg, Args, CacheMode, DeliveryMode,
        FromArg, GroupId, HandlerError, IdentityId, IdentityRegistry, InstanceId,
        InvokeContext, MethodId, Outbox, OutboxMessage, PeerId, RouterConfig, SendOptions,
        Target, TimeSync,
    };
}

cfg_if! {
    if #[cfg(feature = "standard_crypto")] {
        pub use rally_shared::handshake::StandardCrypto;
    }
}

mod cache;
mod error;
mod events;
mod group;
mod peer;
mod route_table;
mod router;
mod server;

pub use cache::{CacheError, CacheScope, CacheTable, CachedMessage, ReplayCache};
pub use error::RallyServerError;
pub use events::{
    ConnectEvent, CustomMessage, CustomMessageEvent, DisconnectEvent, ErrorEvent, Event, Events,
    GroupJoin, GroupJoinEvent, GroupLeave, GroupLeaveEvent,
};
pub use group::{Departure, Group, GroupRegistry, JoinError, LeaveError, TargetError};
pub use peer::{Peer, PeerError, PeerRegistry, PeerState};
pub use route_table::{RouteError, RouteHandler, RouteTable};
pub use router::{MessageRouter, RouterError};
pub use server::{Server, ServerConfig};
