use rally_serde::{BufferPool, PooledBuffer, Serde, WireBuffer};

use crate::{
    Args, HostType, IdentityId, InstanceId, MessageType, MethodId, PeerId,
};

use super::{FrameError, RouteHeader};

/// Outcome carried by a `Response` frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseStatus {
    Ok,
    NotFound,
    Rejected,
}

impl ResponseStatus {
    fn to_byte(self) -> u8 {
        match self {
            ResponseStatus::Ok => 0,
            ResponseStatus::NotFound => 1,
            ResponseStatus::Rejected => 2,
        }
    }

    fn from_byte(status: u8) -> Result<Self, FrameError> {
        match status {
            0 => Ok(ResponseStatus::Ok),
            1 => Ok(ResponseStatus::NotFound),
            2 => Ok(ResponseStatus::Rejected),
            status => Err(FrameError::UnknownResponseStatus { status }),
        }
    }
}

/// One decoded wire message.
///
/// `BeginHandshake` has a different body in each direction: the server
/// offers its public key ([`Frame::HandshakeOffer`]) and the client replies
/// with its sealed session key ([`Frame::HandshakeReply`]).
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    NtpQuery {
        body: Vec<u8>,
    },
    HandshakeOffer {
        peer_id: PeerId,
        public_key: Vec<u8>,
    },
    HandshakeReply {
        sealed_key: Vec<u8>,
    },
    EndHandshake,
    LocalInvoke {
        header: RouteHeader,
        identity: IdentityId,
        instance: InstanceId,
        method: MethodId,
        args: Args,
    },
    GlobalInvoke {
        header: RouteHeader,
        identity: IdentityId,
        method: MethodId,
        args: Args,
    },
    JoinGroup {
        name: String,
    },
    LeaveGroup {
        name: String,
        reason: String,
    },
    Request {
        request_id: u32,
        route: String,
        payload: Vec<u8>,
    },
    Response {
        request_id: u32,
        status: ResponseStatus,
        payload: Vec<u8>,
    },
    Custom {
        kind: u8,
        header: RouteHeader,
        payload: Vec<u8>,
    },
}

impl Frame {
    pub fn message_type(&self) -> MessageType {
        match self {
            Frame::NtpQuery { .. } => MessageType::NtpQuery,
            Frame::HandshakeOffer { .. } | Frame::HandshakeReply { .. } => {
                MessageType::BeginHandshake
            }
            Frame::EndHandshake => MessageType::EndHandshake,
            Frame::LocalInvoke { .. } => MessageType::LocalInvoke,
            Frame::GlobalInvoke { .. } => MessageType::GlobalInvoke,
            Frame::JoinGroup { .. } => MessageType::JoinGroup,
            Frame::LeaveGroup { .. } => MessageType::LeaveGroup,
            Frame::Request { .. } => MessageType::Request,
            Frame::Response { .. } => MessageType::Response,
            Frame::Custom { kind, .. } => MessageType::Custom(*kind),
        }
    }

    pub fn header(&self) -> Option<&RouteHeader> {
        match self {
            Frame::LocalInvoke { header, .. }
            | Frame::GlobalInvoke { header, .. }
            | Frame::Custom { header, .. } => Some(header),
            _ => None,
        }
    }

    pub fn header_mut(&mut self) -> Option<&mut RouteHeader> {
        match self {
            Frame::LocalInvoke { header, .. }
            | Frame::GlobalInvoke { header, .. }
            | Frame::Custom { header, .. } => Some(header),
            _ => None,
        }
    }

    /// Reads one frame. `receiver` is the side doing the reading, which
    /// decides how a `BeginHandshake` body is interpreted
    pub fn read(reader: &mut WireBuffer, receiver: HostType) -> Result<Self, FrameError> {
        if reader.remaining() == 0 {
            return Err(FrameError::Empty);
        }
        let frame = match MessageType::de(reader)? {
            MessageType::NtpQuery => Frame::NtpQuery {
                body: reader.read_remaining().to_vec(),
            },
            MessageType::BeginHandshake => match receiver {
                HostType::Client => Frame::HandshakeOffer {
                    peer_id: PeerId::new(reader.read_var_u32()?),
                    public_key: reader.read_prefixed_bytes()?.to_vec(),
                },
                HostType::Server => Frame::HandshakeReply {
                    sealed_key: reader.read_prefixed_bytes()?.to_vec(),
                },
            },
            MessageType::EndHandshake => Frame::EndHandshake,
            MessageType::LocalInvoke => Frame::LocalInvoke {
                header: RouteHeader::de(reader)?,
                identity: reader.read_i32()?,
                instance: reader.read_u8()?,
                method: reader.read_u8()?,
                args: Args::de(reader)?,
            },
            MessageType::GlobalInvoke => Frame::GlobalInvoke {
                header: RouteHeader::de(reader)?,
                identity: reader.read_i32()?,
                method: reader.read_u8()?,
                args: Args::de(reader)?,
            },
            MessageType::JoinGroup => Frame::JoinGroup {
                name: reader.read_string()?,
            },
            MessageType::LeaveGroup => Frame::LeaveGroup {
                name: reader.read_string()?,
                reason: reader.read_string()?,
            },
            MessageType::Request => Frame::Request {
                request_id: reader.read_var_u32()?,
                route: reader.read_string()?,
                payload: reader.read_remaining().to_vec(),
            },
            MessageType::Response => Frame::Response {
                request_id: reader.read_var_u32()?,
                status: ResponseStatus::from_byte(reader.read_u8()?)?,
                payload: reader.read_remaining().to_vec(),
            },
            MessageType::Custom(kind) => Frame::Custom {
                kind,
                header: RouteHeader::de(reader)?,
                payload: reader.read_remaining().to_vec(),
            },
        };
        Ok(frame)
    }

    pub fn write(&self, writer: &mut WireBuffer) -> Result<(), FrameError> {
        if let Frame::Custom { kind, .. } = self {
            if *kind < MessageType::FIRST_CUSTOM {
                return Err(FrameError::ReservedKind {
                    kind: *kind,
                    first: MessageType::FIRST_CUSTOM,
                });
            }
        }
        self.message_type().ser(writer)?;
        match self {
            Frame::NtpQuery { body } => writer.write_bytes(body)?,
            Frame::HandshakeOffer {
                peer_id,
                public_key,
            } => {
                writer.write_var_u32(peer_id.get())?;
                writer.write_prefixed_bytes(public_key)?;
            }
            Frame::HandshakeReply { sealed_key } => writer.write_prefixed_bytes(sealed_key)?,
            Frame::EndHandshake => {}
            Frame::LocalInvoke {
                header,
                identity,
                instance,
                method,
                args,
            } => {
                header.ser(writer)?;
                writer.write_i32(*identity)?;
                writer.write_u8(*instance)?;
                writer.write_u8(*method)?;
                args.ser(writer)?;
            }
            Frame::GlobalInvoke {
                header,
                identity,
                method,
                args,
            } => {
                header.ser(writer)?;
                writer.write_i32(*identity)?;
                writer.write_u8(*method)?;
                args.ser(writer)?;
            }
            Frame::JoinGroup { name } => writer.write_string(name)?,
            Frame::LeaveGroup { name, reason } => {
                writer.write_string(name)?;
                writer.write_string(reason)?;
            }
            Frame::Request {
                request_id,
                route,
                payload,
            } => {
                writer.write_var_u32(*request_id)?;
                writer.write_string(route)?;
                writer.write_bytes(payload)?;
            }
            Frame::Response {
                request_id,
                status,
                payload,
            } => {
                writer.write_var_u32(*request_id)?;
                writer.write_u8(status.to_byte())?;
                writer.write_bytes(payload)?;
            }
            Frame::Custom {
                header, payload, ..
            } => {
                header.ser(writer)?;
                writer.write_bytes(payload)?;
            }
        }
        Ok(())
    }

    /// Writes the frame into a buffer rented from `pool`, ready to be sent
    pub fn to_buffer(&self, pool: &BufferPool) -> Result<PooledBuffer, FrameError> {
        let mut buffer = pool.rent();
        self.write(&mut buffer)?;
        buffer.seek_to_begin();
        Ok(buffer)
    }

    /// Decodes `bytes` through a buffer rented from `pool`
    pub fn decode(bytes: &[u8], pool: &BufferPool, receiver: HostType) -> Result<Self, FrameError> {
        let mut buffer = pool.rent_filled(bytes);
        Frame::read(&mut buffer, receiver)
    }
}
