use crate::{Args, Frame, IdentityId, InstanceId, MethodId, PeerId, RouteHeader, SendOptions};

/// A send queued by a handler, routed by the host once the handler returns
#[derive(Clone, Debug, PartialEq)]
pub enum OutboxMessage {
    LocalInvoke {
        identity: IdentityId,
        instance: InstanceId,
        method: MethodId,
        args: Args,
        options: SendOptions,
    },
    GlobalInvoke {
        identity: IdentityId,
        method: MethodId,
        args: Args,
        options: SendOptions,
    },
    Custom {
        kind: u8,
        payload: Vec<u8>,
        options: SendOptions,
    },
}

impl OutboxMessage {
    /// Frames the message as sent by `sender`
    pub fn into_frame(self, sender: PeerId) -> Frame {
        match self {
            OutboxMessage::LocalInvoke {
                identity,
                instance,
                method,
                args,
                options,
            } => Frame::LocalInvoke {
                header: RouteHeader::new(sender, options),
                identity,
                instance,
                method,
                args,
            },
            OutboxMessage::GlobalInvoke {
                identity,
                method,
                args,
                options,
            } => Frame::GlobalInvoke {
                header: RouteHeader::new(sender, options),
                identity,
                method,
                args,
            },
            OutboxMessage::Custom {
                kind,
                payload,
                options,
            } => Frame::Custom {
                kind,
                header: RouteHeader::new(sender, options),
                payload,
            },
        }
    }

    pub fn options(&self) -> &SendOptions {
        match self {
            OutboxMessage::LocalInvoke { options, .. }
            | OutboxMessage::GlobalInvoke { options, .. }
            | OutboxMessage::Custom { options, .. } => options,
        }
    }
}

/// Collects the replies of a handler
#[derive(Debug, Default)]
pub struct Outbox {
    messages: Vec<OutboxMessage>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_invoke(
        &mut self,
        identity: IdentityId,
        instance: InstanceId,
        method: MethodId,
        args: Args,
        options: SendOptions,
    ) {
        self.messages.push(OutboxMessage::LocalInvoke {
            identity,
            instance,
            method,
            args,
            options,
        });
    }

    pub fn global_invoke(
        &mut self,
        identity: IdentityId,
        method: MethodId,
        args: Args,
        options: SendOptions,
    ) {
        self.messages.push(OutboxMessage::GlobalInvoke {
            identity,
            method,
            args,
            options,
        });
    }

    pub fn custom(&mut self, kind: u8, payload: Vec<u8>, options: SendOptions) {
        self.messages.push(OutboxMessage::Custom {
            kind,
            payload,
            options,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, OutboxMessage> {
        self.messages.drain(..)
    }
}
