//! Device enumeration and queries.

use crate::error::TransportError;
use crate::packet::Packet;
use crate::packets::simple::id_param_packet;
use crate::stream::ByteStream;
use crate::tag::PacketTag;
use crate::ObjectId;

/// Requests the device IDs of a platform; answered with an `IdList`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetDeviceIds {
    /// Host-API device-type bitfield.
    pub device_type: u64,
    /// Platform to enumerate, or [`NULL_ID`](crate::NULL_ID) for the
    /// implementation default.
    pub platform_id: ObjectId,
}

impl Packet for GetDeviceIds {
    const TAG: PacketTag = PacketTag::GetDeviceIDs;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u64(self.device_type).await?;
        stream.write_u16(self.platform_id).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            device_type: stream.read_u64().await?,
            platform_id: stream.read_u16().await?,
        })
    }
}

id_param_packet!(
    /// A device info query; answered with a payload, an `Id` (platform) or
    /// an `IdList` (sub-device parents have no remoting support, so lists
    /// only appear for partition queries).
    GetDeviceInfo,
    GetDeviceInfo
);
