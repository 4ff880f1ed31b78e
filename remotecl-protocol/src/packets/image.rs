//! Image object creation, transfers and queries.

use crate::error::TransportError;
use crate::packet::Packet;
use crate::packets::simple::id_param_packet;
use crate::stream::ByteStream;
use crate::tag::PacketTag;
use crate::wire::{read_array, write_array};
use crate::ObjectId;

/// Creates an image object.
///
/// When the flags request a host-pointer copy, the server answers with a
/// `Payload<u32>` byte count, then reads the pixel payload before creating
/// the image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateImage {
    pub flags: u32,
    pub channel_order: u32,
    pub channel_type: u32,
    pub image_type: u32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub array_size: u32,
    pub row_pitch: u32,
    pub slice_pitch: u32,
    pub mip_levels: u32,
    pub samples: u32,
    pub context: ObjectId,
}

impl Packet for CreateImage {
    const TAG: PacketTag = PacketTag::CreateImage;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u32(self.flags).await?;
        stream.write_u32(self.channel_order).await?;
        stream.write_u32(self.channel_type).await?;
        stream.write_u32(self.image_type).await?;
        stream.write_u32(self.width).await?;
        stream.write_u32(self.height).await?;
        stream.write_u32(self.depth).await?;
        stream.write_u32(self.array_size).await?;
        stream.write_u32(self.row_pitch).await?;
        stream.write_u32(self.slice_pitch).await?;
        stream.write_u32(self.mip_levels).await?;
        stream.write_u32(self.samples).await?;
        stream.write_u16(self.context).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            flags: stream.read_u32().await?,
            channel_order: stream.read_u32().await?,
            channel_type: stream.read_u32().await?,
            image_type: stream.read_u32().await?,
            width: stream.read_u32().await?,
            height: stream.read_u32().await?,
            depth: stream.read_u32().await?,
            array_size: stream.read_u32().await?,
            row_pitch: stream.read_u32().await?,
            slice_pitch: stream.read_u32().await?,
            mip_levels: stream.read_u32().await?,
            samples: stream.read_u32().await?,
            context: stream.read_u16().await?,
        })
    }
}

macro_rules! image_rw_packet {
    ($(#[$doc:meta])* $name:ident, $tag:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            pub image: ObjectId,
            pub queue: ObjectId,
            pub origin: [u32; 3],
            pub region: [u32; 3],
            pub row_pitch: u32,
            pub slice_pitch: u32,
            pub want_event: bool,
            pub expect_event_list: bool,
            pub block: bool,
        }

        impl Packet for $name {
            const TAG: PacketTag = PacketTag::$tag;

            async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
                stream.write_u16(self.image).await?;
                stream.write_u16(self.queue).await?;
                write_array(stream, &self.origin).await?;
                write_array(stream, &self.region).await?;
                stream.write_u32(self.row_pitch).await?;
                stream.write_u32(self.slice_pitch).await?;
                stream.write_bool(self.want_event).await?;
                stream.write_bool(self.expect_event_list).await?;
                stream.write_bool(self.block).await
            }

            async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
                Ok(Self {
                    image: stream.read_u16().await?,
                    queue: stream.read_u16().await?,
                    origin: read_array(stream).await?,
                    region: read_array(stream).await?,
                    row_pitch: stream.read_u32().await?,
                    slice_pitch: stream.read_u32().await?,
                    want_event: stream.read_bool().await?,
                    expect_event_list: stream.read_bool().await?,
                    block: stream.read_bool().await?,
                })
            }
        }
    };
}

image_rw_packet!(
    /// Reads an image region; the pixel size is resolved server-side and
    /// the data comes back as a payload.
    ReadImage,
    ReadImage
);

image_rw_packet!(
    /// Writes an image region. The server answers with the required byte
    /// count as a `Payload<u32>`, then reads the pixel payload.
    WriteImage,
    WriteImage
);

id_param_packet!(
    /// An image info query; answered with a payload or an `Id` for the
    /// backing-buffer parameter.
    GetImageInfo,
    GetImageInfo
);
