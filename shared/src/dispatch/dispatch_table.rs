use std::collections::HashMap;

use log::{debug, error};

use crate::{Args, IdentityId, InstanceId, MethodId, PeerId};

use super::{DispatchError, HandlerError, Outbox};

/// Method id reserved for the internal property synchronization channel
pub const PROPERTY_SYNC_METHOD: MethodId = 255;
/// Largest arity a handler may declare
pub const MAX_ARITY: usize = 5;

/// Describes the call being dispatched
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvokeContext {
    /// Peer that originated the call
    pub sender: PeerId,
    pub identity: IdentityId,
    /// Set for per-instance (local) invokes
    pub instance: Option<InstanceId>,
    pub method: MethodId,
}

pub type Handler =
    Box<dyn FnMut(&InvokeContext, &Args, &mut Outbox) -> Result<(), HandlerError> + Send>;

struct DispatchEntry {
    arity: usize,
    requires_ownership: bool,
    handler: Handler,
}

/// Maps a method id to one handler with a fixed arity
#[derive(Default)]
pub struct DispatchTable {
    entries: HashMap<MethodId, DispatchEntry>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `method`.
    ///
    /// A duplicate id keeps the first registration and returns
    /// [`DispatchError::DuplicateMethod`]. Repeated claims of
    /// [`PROPERTY_SYNC_METHOD`] are skipped without an error, so layered
    /// handler owners can each try to claim the shared sync entry.
    pub fn register<F>(
        &mut self,
        method: MethodId,
        arity: usize,
        requires_ownership: bool,
        handler: F,
    ) -> Result<(), DispatchError>
    where
        F: FnMut(&InvokeContext, &Args, &mut Outbox) -> Result<(), HandlerError> + Send + 'static,
    {
        if arity > MAX_ARITY {
            let error = DispatchError::ArityTooLarge {
                method,
                arity,
                max: MAX_ARITY,
            };
            error!("{}", error);
            return Err(error);
        }
        if self.entries.contains_key(&method) {
            if method == PROPERTY_SYNC_METHOD {
                debug!("property sync method already claimed, skipping");
                return Ok(());
            }
            let error = DispatchError::DuplicateMethod { method };
            error!("{}", error);
            return Err(error);
        }
        self.entries.insert(
            method,
            DispatchEntry {
                arity,
                requires_ownership,
                handler: Box::new(handler),
            },
        );
        Ok(())
    }

    pub fn unregister(&mut self, method: MethodId) -> bool {
        self.entries.remove(&method).is_some()
    }

    pub fn contains(&self, method: MethodId) -> bool {
        self.entries.contains_key(&method)
    }

    pub fn arity(&self, method: MethodId) -> Option<usize> {
        self.entries.get(&method).map(|entry| entry.arity)
    }

    pub fn requires_ownership(&self, method: MethodId) -> Option<bool> {
        self.entries
            .get(&method)
            .map(|entry| entry.requires_ownership)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs the handler registered for `ctx.method` after checking the
    /// caller's arity against the declared one
    pub fn invoke(
        &mut self,
        ctx: &InvokeContext,
        args: &Args,
        outbox: &mut Outbox,
    ) -> Result<(), DispatchError> {
        let method = ctx.method;
        let Some(entry) = self.entries.get_mut(&method) else {
            return Err(DispatchError::UnknownMethod { method });
        };
        if args.arity() != entry.arity {
            let error = DispatchError::ArityMismatch {
                method,
                expected: entry.arity,
                actual: args.arity(),
            };
            error!("{}", error);
            return Err(error);
        }
        (entry.handler)(ctx, args, outbox).map_err(|source| DispatchError::Handler { method, source })
    }
}
