//! # Rally Shared
//! Common functionality shared between rally-server & rally-client crates:
//! identifiers, wire frames, handler dispatch, handshake crypto, request
//! tracking and the transport boundary.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

pub use rally_serde::{
    BufferPool, PooledBuffer, Serde, SerdeErr, TextEncoding, VarU32, WireBuffer,
};

mod cache_mode;
mod delivery_mode;
mod dispatch;
mod frame;
pub mod handshake;
mod message_type;
mod request;
mod router_config;
mod send_options;
mod target;
mod thread_guard;
mod time_sync;
pub mod transport;
mod types;

pub use cache_mode::{CacheMode, CacheModeError};
pub use delivery_mode::DeliveryMode;
pub use dispatch::{
    Arg, Args, DispatchError, DispatchTable, FromArg, Handler, HandlerError, IdentityRegistry,
    InvokeContext, Outbox, OutboxMessage, MAX_ARITY, PROPERTY_SYNC_METHOD,
};
pub use frame::{open_frame, seal_frame, Frame, FrameError, ResponseStatus, RouteHeader};
pub use message_type::MessageType;
pub use request::{RequestError, RequestTracker, ResponseReceiveKey};
pub use router_config::RouterConfig;
pub use send_options::SendOptions;
pub use target::Target;
pub use thread_guard::ThreadGuard;
pub use time_sync::TimeSync;
pub use types::{GroupId, HostType, IdentityId, InstanceId, MethodId, PeerId, SequenceChannel};
