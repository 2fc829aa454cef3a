mod arg;
mod dispatch_table;
mod error;
mod identity_registry;
mod outbox;

pub use arg::{Arg, Args, FromArg};
pub use dispatch_table::{
    DispatchTable, Handler, InvokeContext, MAX_ARITY, PROPERTY_SYNC_METHOD,
};
pub use error::{DispatchError, HandlerError};
pub use identity_registry::IdentityRegistry;
pub use outbox::{Outbox, OutboxMessage};
