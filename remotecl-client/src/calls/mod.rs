//! One thin async call per remoted operation.
//!
//! Each call acquires the connection lock, writes one request (plus any
//! follow-up packets its operation defines), flushes, and reads one
//! response. These are the functions the surface bindings translate the
//! host API into.

use crate::error::ClientError;
use remotecl_protocol::packets::{IdListPacket, IdPacket};
use remotecl_protocol::payload::Payload;
use remotecl_protocol::{ObjectId, PacketStream, PacketTag};

pub mod context;
pub mod device;
pub mod event;
pub mod image;
pub mod kernel;
pub mod memory;
pub mod platform;
pub mod program;
pub mod queue;
pub mod refcount;

pub use context::ImageFormatInfo;
pub use kernel::KernelArgValue;

/// The response to an info query, shaped by what the server sent.
///
/// Object-valued parameters come back as IDs; the calls that know their
/// parameter names register the proxies of the right kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoReply {
    Bytes(Vec<u8>),
    Id(ObjectId),
    Ids(Vec<ObjectId>),
    /// Program binaries, one blob per device.
    Binaries(Vec<Vec<u8>>),
}

impl InfoReply {
    /// The raw bytes of a byte-shaped reply.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            InfoReply::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Reads an info response, discriminating on the peeked tag. In-band
/// errors are surfaced through the `recv` promotion.
pub(crate) async fn read_info_reply(stream: &mut PacketStream) -> Result<InfoReply, ClientError> {
    match stream.next_tag().await? {
        PacketTag::Id => Ok(InfoReply::Id(stream.recv::<IdPacket>().await?.0)),
        PacketTag::IdList => Ok(InfoReply::Ids(stream.recv::<IdListPacket>().await?.ids)),
        // Payload, or an error packet that recv turns into Err.
        _ => Ok(InfoReply::Bytes(
            stream.recv::<Payload>().await?.into_data(),
        )),
    }
}
