use std::collections::HashMap;

use log::warn;

use crate::{Args, IdentityId, InstanceId, MethodId, PeerId};

use super::{DispatchError, DispatchTable, HandlerError, InvokeContext, Outbox};

struct IdentityEntry {
    owner: PeerId,
    global: DispatchTable,
    instances: HashMap<InstanceId, DispatchTable>,
}

/// Addressable application objects and their handler tables.
///
/// Every identity has an owner peer, one table for global (service-style)
/// methods and one table per instance for local (per-object) methods.
#[derive(Default)]
pub struct IdentityRegistry {
    identities: HashMap<IdentityId, IdentityEntry>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_identity(
        &mut self,
        identity: IdentityId,
        owner: PeerId,
    ) -> Result<(), DispatchError> {
        if self.identities.contains_key(&identity) {
            return Err(DispatchError::DuplicateIdentity { identity });
        }
        self.identities.insert(
            identity,
            IdentityEntry {
                owner,
                global: DispatchTable::new(),
                instances: HashMap::new(),
            },
        );
        Ok(())
    }

    pub fn remove_identity(&mut self, identity: IdentityId) -> bool {
        self.identities.remove(&identity).is_some()
    }

    pub fn contains(&self, identity: IdentityId) -> bool {
        self.identities.contains_key(&identity)
    }

    pub fn owner(&self, identity: IdentityId) -> Option<PeerId> {
        self.identities.get(&identity).map(|entry| entry.owner)
    }

    pub fn set_owner(&mut self, identity: IdentityId, owner: PeerId) -> Result<(), DispatchError> {
        let entry = self
            .identities
            .get_mut(&identity)
            .ok_or(DispatchError::UnknownIdentity { identity })?;
        entry.owner = owner;
        Ok(())
    }

    pub fn register_global<F>(
        &mut self,
        identity: IdentityId,
        method: MethodId,
        arity: usize,
        requires_ownership: bool,
        handler: F,
    ) -> Result<(), DispatchError>
    where
        F: FnMut(&InvokeContext, &Args, &mut Outbox) -> Result<(), HandlerError> + Send + 'static,
    {
        let entry = self
            .identities
            .get_mut(&identity)
            .ok_or(DispatchError::UnknownIdentity { identity })?;
        entry
            .global
            .register(method, arity, requires_ownership, handler)
    }

    pub fn register_local<F>(
        &mut self,
        identity: IdentityId,
        instance: InstanceId,
        method: MethodId,
        arity: usize,
        requires_ownership: bool,
        handler: F,
    ) -> Result<(), DispatchError>
    where
        F: FnMut(&InvokeContext, &Args, &mut Outbox) -> Result<(), HandlerError> + Send + 'static,
    {
        let entry = self
            .identities
            .get_mut(&identity)
            .ok_or(DispatchError::UnknownIdentity { identity })?;
        entry
            .instances
            .entry(instance)
            .or_default()
            .register(method, arity, requires_ownership, handler)
    }

    /// Checks that `caller` may invoke the method addressed by `ctx`,
    /// without running it
    pub fn authorize(&self, ctx: &InvokeContext) -> Result<(), DispatchError> {
        let identity = ctx.identity;
        let entry = self
            .identities
            .get(&identity)
            .ok_or(DispatchError::UnknownIdentity { identity })?;
        let table = match ctx.instance {
            None => &entry.global,
            Some(instance) => entry
                .instances
                .get(&instance)
                .ok_or(DispatchError::UnknownInstance { identity, instance })?,
        };
        let requires_ownership =
            table
                .requires_ownership(ctx.method)
                .ok_or(DispatchError::UnknownMethod {
                    method: ctx.method,
                })?;
        if requires_ownership && ctx.sender != entry.owner {
            let error = DispatchError::OwnershipViolation {
                identity,
                method: ctx.method,
                caller: ctx.sender,
                owner: entry.owner,
            };
            warn!("dropping call: {}", error);
            return Err(error);
        }
        Ok(())
    }

    /// Invokes a global method, enforcing ownership
    pub fn invoke_global(
        &mut self,
        ctx: &InvokeContext,
        args: &Args,
        outbox: &mut Outbox,
    ) -> Result<(), DispatchError> {
        debug_assert!(ctx.instance.is_none());
        self.authorize(ctx)?;
        let identity = ctx.identity;
        let entry = self
            .identities
            .get_mut(&identity)
            .ok_or(DispatchError::UnknownIdentity { identity })?;
        entry.global.invoke(ctx, args, outbox)
    }

    /// Invokes a per-instance method, enforcing ownership
    pub fn invoke_local(
        &mut self,
        ctx: &InvokeContext,
        args: &Args,
        outbox: &mut Outbox,
    ) -> Result<(), DispatchError> {
        self.authorize(ctx)?;
        let identity = ctx.identity;
        let instance = ctx
            .instance
            .ok_or(DispatchError::UnknownIdentity { identity })?;
        let table = self
            .identities
            .get_mut(&identity)
            .and_then(|entry| entry.instances.get_mut(&instance))
            .ok_or(DispatchError::UnknownInstance { identity, instance })?;
        table.invoke(ctx, args, outbox)
    }

    pub fn clear(&mut self) {
        self.identities.clear();
    }
}
