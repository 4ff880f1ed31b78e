//! Command-queue creation, queries, flush and finish.

use crate::error::TransportError;
use crate::packet::Packet;
use crate::packets::simple::{id_packet, id_param_packet};
use crate::stream::ByteStream;
use crate::tag::PacketTag;
use crate::wire::{read_seq, write_seq};
use crate::ObjectId;

/// Creates a command queue with a property bitfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateQueue {
    pub context: ObjectId,
    pub device: ObjectId,
    pub properties: u32,
}

impl Packet for CreateQueue {
    const TAG: PacketTag = PacketTag::CreateQueue;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u16(self.context).await?;
        stream.write_u16(self.device).await?;
        stream.write_u32(self.properties).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            context: stream.read_u16().await?,
            device: stream.read_u16().await?,
            properties: stream.read_u32().await?,
        })
    }
}

/// Creates a command queue with a zero-terminated property list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateQueueWithProp {
    pub context: ObjectId,
    pub device: ObjectId,
    pub properties: Vec<u64>,
}

impl Packet for CreateQueueWithProp {
    const TAG: PacketTag = PacketTag::CreateQueueWithProp;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u16(self.context).await?;
        stream.write_u16(self.device).await?;
        write_seq::<u8, u64>(stream, &self.properties).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            context: stream.read_u16().await?,
            device: stream.read_u16().await?,
            properties: read_seq::<u8, u64>(stream).await?,
        })
    }
}

id_param_packet!(
    /// A queue info query; answered with a payload or an `Id` for the
    /// context/device parameters.
    GetQueueInfo,
    GetQueueInfo
);

id_packet!(
    /// Flushes a queue's pending commands.
    FlushQueue,
    Flush
);

id_packet!(
    /// Blocks until a queue's commands have completed.
    FinishQueue,
    Finish
);
