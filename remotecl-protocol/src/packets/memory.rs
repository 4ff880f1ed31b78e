//! Buffer object creation, transfers and queries.

use crate::error::TransportError;
use crate::packet::Packet;
use crate::packets::simple::id_param_packet;
use crate::stream::ByteStream;
use crate::tag::PacketTag;
use crate::wire::{read_array, write_array};
use crate::ObjectId;

/// Largest fill pattern the protocol carries: the host API's widest
/// primitive is a 16-wide vector of 8-byte lanes.
pub const MAX_FILL_PATTERN: usize = 128;

/// Creates a buffer. When `expect_payload` is set, a payload with the
/// initial contents follows this packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateBuffer {
    pub flags: u32,
    pub size: u32,
    pub context: ObjectId,
    pub expect_payload: bool,
}

impl Packet for CreateBuffer {
    const TAG: PacketTag = PacketTag::CreateBuffer;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u32(self.flags).await?;
        stream.write_u32(self.size).await?;
        stream.write_u16(self.context).await?;
        stream.write_bool(self.expect_payload).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            flags: stream.read_u32().await?,
            size: stream.read_u32().await?,
            context: stream.read_u16().await?,
            expect_payload: stream.read_bool().await?,
        })
    }
}

/// Creates a sub-buffer over a region of an existing buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateSubBuffer {
    pub flags: u32,
    pub size: u32,
    pub offset: u32,
    pub create_type: u32,
    pub buffer: ObjectId,
}

impl Packet for CreateSubBuffer {
    const TAG: PacketTag = PacketTag::CreateSubBuffer;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u32(self.flags).await?;
        stream.write_u32(self.size).await?;
        stream.write_u32(self.offset).await?;
        stream.write_u32(self.create_type).await?;
        stream.write_u16(self.buffer).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            flags: stream.read_u32().await?,
            size: stream.read_u32().await?,
            offset: stream.read_u32().await?,
            create_type: stream.read_u32().await?,
            buffer: stream.read_u16().await?,
        })
    }
}

macro_rules! buffer_rw_packet {
    ($(#[$doc:meta])* $name:ident, $tag:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            pub buffer: ObjectId,
            pub queue: ObjectId,
            pub size: u32,
            pub offset: u32,
            pub want_event: bool,
            pub expect_event_list: bool,
            pub block: bool,
        }

        impl Packet for $name {
            const TAG: PacketTag = PacketTag::$tag;

            async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
                stream.write_u16(self.buffer).await?;
                stream.write_u16(self.queue).await?;
                stream.write_u32(self.size).await?;
                stream.write_u32(self.offset).await?;
                stream.write_bool(self.want_event).await?;
                stream.write_bool(self.expect_event_list).await?;
                stream.write_bool(self.block).await
            }

            async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
                Ok(Self {
                    buffer: stream.read_u16().await?,
                    queue: stream.read_u16().await?,
                    size: stream.read_u32().await?,
                    offset: stream.read_u32().await?,
                    want_event: stream.read_bool().await?,
                    expect_event_list: stream.read_bool().await?,
                    block: stream.read_bool().await?,
                })
            }
        }
    };
}

buffer_rw_packet!(
    /// Reads a buffer region; answered with an optional event `Id` then the
    /// data payload.
    ReadBuffer,
    ReadBuffer
);

buffer_rw_packet!(
    /// Writes a buffer region; a data payload follows this packet and the
    /// answer is an optional event `Id` then `Success`.
    WriteBuffer,
    WriteBuffer
);

/// Reads a rectangular region of a buffer.
///
/// All four pitches travel as distinct fields; the server sizes the reply
/// from the host-side pitches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadBufferRect {
    pub buffer: ObjectId,
    pub queue: ObjectId,
    pub buffer_origin: [u32; 3],
    pub host_origin: [u32; 3],
    pub region: [u32; 3],
    pub buffer_row_pitch: u32,
    pub buffer_slice_pitch: u32,
    pub host_row_pitch: u32,
    pub host_slice_pitch: u32,
    pub want_event: bool,
    pub expect_event_list: bool,
    pub block: bool,
}

impl Packet for ReadBufferRect {
    const TAG: PacketTag = PacketTag::ReadBufferRect;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u16(self.buffer).await?;
        stream.write_u16(self.queue).await?;
        write_array(stream, &self.buffer_origin).await?;
        write_array(stream, &self.host_origin).await?;
        write_array(stream, &self.region).await?;
        stream.write_u32(self.buffer_row_pitch).await?;
        stream.write_u32(self.buffer_slice_pitch).await?;
        stream.write_u32(self.host_row_pitch).await?;
        stream.write_u32(self.host_slice_pitch).await?;
        stream.write_bool(self.want_event).await?;
        stream.write_bool(self.expect_event_list).await?;
        stream.write_bool(self.block).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            buffer: stream.read_u16().await?,
            queue: stream.read_u16().await?,
            buffer_origin: read_array(stream).await?,
            host_origin: read_array(stream).await?,
            region: read_array(stream).await?,
            buffer_row_pitch: stream.read_u32().await?,
            buffer_slice_pitch: stream.read_u32().await?,
            host_row_pitch: stream.read_u32().await?,
            host_slice_pitch: stream.read_u32().await?,
            want_event: stream.read_bool().await?,
            expect_event_list: stream.read_bool().await?,
            block: stream.read_bool().await?,
        })
    }
}

/// Fills a buffer region with a repeated pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillBuffer {
    pub buffer: ObjectId,
    pub queue: ObjectId,
    pub size: u32,
    pub offset: u32,
    pub pattern_size: u8,
    pub want_event: bool,
    pub expect_event_list: bool,
    pub pattern: [u8; MAX_FILL_PATTERN],
}

impl Packet for FillBuffer {
    const TAG: PacketTag = PacketTag::FillBuffer;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u16(self.buffer).await?;
        stream.write_u16(self.queue).await?;
        stream.write_u32(self.size).await?;
        stream.write_u32(self.offset).await?;
        stream.write_u8(self.pattern_size).await?;
        stream.write_bool(self.want_event).await?;
        stream.write_bool(self.expect_event_list).await?;
        stream.write_all(&self.pattern).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        let buffer = stream.read_u16().await?;
        let queue = stream.read_u16().await?;
        let size = stream.read_u32().await?;
        let offset = stream.read_u32().await?;
        let pattern_size = stream.read_u8().await?;
        let want_event = stream.read_bool().await?;
        let expect_event_list = stream.read_bool().await?;
        let mut pattern = [0u8; MAX_FILL_PATTERN];
        stream.read_exact(&mut pattern).await?;
        Ok(Self {
            buffer,
            queue,
            size,
            offset,
            pattern_size,
            want_event,
            expect_event_list,
            pattern,
        })
    }
}

id_param_packet!(
    /// A memory-object info query; answered with a payload or an `Id` for
    /// the context/parent parameters.
    GetMemObjInfo,
    GetMemObjInfo
);
