//! Context creation and queries.

use crate::error::TransportError;
use crate::packet::Packet;
use crate::packets::simple::id_param_packet;
use crate::stream::ByteStream;
use crate::tag::PacketTag;
use crate::wire::{read_seq, write_seq};
use crate::ObjectId;

/// Creates a context over an explicit device list.
///
/// Properties travel as flat `u64` pairs; platform-valued properties carry
/// an object ID in the value slot, which the server translates back to a
/// native handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateContext {
    pub properties: Vec<u64>,
    pub devices: Vec<ObjectId>,
}

impl Packet for CreateContext {
    const TAG: PacketTag = PacketTag::CreateContext;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        write_seq::<u8, u64>(stream, &self.properties).await?;
        write_seq::<u16, u16>(stream, &self.devices).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            properties: read_seq::<u8, u64>(stream).await?,
            devices: read_seq::<u16, u16>(stream).await?,
        })
    }
}

/// Creates a context from a device-type bitfield.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateContextFromType {
    pub device_type: u64,
    pub properties: Vec<u64>,
}

impl Packet for CreateContextFromType {
    const TAG: PacketTag = PacketTag::CreateContextFromType;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u64(self.device_type).await?;
        write_seq::<u8, u64>(stream, &self.properties).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            device_type: stream.read_u64().await?,
            properties: read_seq::<u8, u64>(stream).await?,
        })
    }
}

id_param_packet!(
    /// A context info query; answered with a payload or an `IdList` for
    /// device-valued parameters.
    GetContextInfo,
    GetContextInfo
);

/// Requests the supported image formats of a context; answered with a
/// `Payload<u16>` of channel-order/channel-type pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetImageFormats {
    pub context_id: ObjectId,
    pub flags: u32,
    pub image_type: u32,
}

impl Packet for GetImageFormats {
    const TAG: PacketTag = PacketTag::GetImageFormats;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u16(self.context_id).await?;
        stream.write_u32(self.flags).await?;
        stream.write_u32(self.image_type).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            context_id: stream.read_u16().await?,
            flags: stream.read_u32().await?,
            image_type: stream.read_u32().await?,
        })
    }
}
