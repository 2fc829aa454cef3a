use thiserror::Error;

use crate::{IdentityId, InstanceId, MethodId, PeerId};

/// Errors raised while registering or invoking dispatch handlers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// A second handler claimed an id that is already registered
    #[error("Method {method} is already registered, keeping the first registration")]
    DuplicateMethod { method: MethodId },

    /// Handlers take at most five arguments
    #[error("Method {method} declares arity {arity}, the maximum is {max}")]
    ArityTooLarge {
        method: MethodId,
        arity: usize,
        max: usize,
    },

    /// No handler is registered under the id
    #[error("No handler is registered for method {method}")]
    UnknownMethod { method: MethodId },

    /// The caller supplied a different number of arguments than the handler declares.
    /// This points at mismatched protocol versions or wiring, not at the network
    #[error("Method {method} takes {expected} arguments but was invoked with {actual}")]
    ArityMismatch {
        method: MethodId,
        expected: usize,
        actual: usize,
    },

    #[error("Identity {identity} is already registered")]
    DuplicateIdentity { identity: IdentityId },

    #[error("Identity {identity} is not registered")]
    UnknownIdentity { identity: IdentityId },

    #[error("Identity {identity} has no instance {instance}")]
    UnknownInstance {
        identity: IdentityId,
        instance: InstanceId,
    },

    /// An ownership-required method was invoked by a peer that does not own the identity
    #[error("{caller} invoked method {method} of identity {identity}, which is owned by {owner}")]
    OwnershipViolation {
        identity: IdentityId,
        method: MethodId,
        caller: PeerId,
        owner: PeerId,
    },

    /// The handler ran and returned an error
    #[error("Handler for method {method} failed: {source}")]
    Handler {
        method: MethodId,
        #[source]
        source: HandlerError,
    },
}

/// Errors returned by application handlers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("Argument {index} is missing, the call has {arity} arguments")]
    MissingArgument { index: usize, arity: usize },

    #[error("Argument {index} is a {found}, expected {expected}")]
    ArgumentType {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{reason}")]
    Failed { reason: String },
}

impl HandlerError {
    pub fn failed(reason: impl Into<String>) -> Self {
        HandlerError::Failed {
            reason: reason.into(),
        }
    }
}
