//! # Rally Client
//! A client that connects to a rally server, negotiates an encrypted
//! session, joins groups, invokes handlers on other peers and issues
//! requests against the server's routes.

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
        InvokeContext, MethodId, Outbox, OutboxMessage, PeerId, RequestError,
        ResponseReceiveKey, SendOptions, Target, TimeSync,
    };
}

cfg_if! {
    if #[cfg(feature = "standard_crypto")] {
        pub use rally_shared::handshake::StandardCrypto;
    }
}

mod client;
mod client_config;
mod error;
mod events;

pub use client::{Client, ConnectionState};
pub use client_config::ClientConfig;
pub use error::{HandshakeError, RallyClientError};
pub use events::{
    ConnectEvent, CustomMessage, CustomMessageEvent, DisconnectEvent, ErrorEvent, Event, Events,
    GroupJoin, GroupJoinEvent, GroupLeave, GroupLeaveEvent,
};
