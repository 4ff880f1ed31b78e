//! Program creation, building and queries.

use crate::error::TransportError;
use crate::packet::Packet;
use crate::packets::simple::{id_packet, id_param_packet};
use crate::stream::ByteStream;
use crate::tag::PacketTag;
use crate::wire::{read_string, write_string};
use crate::ObjectId;

/// Creates a program from source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateSourceProgram {
    /// Parent context.
    pub context: ObjectId,
    pub source: String,
}

impl Packet for CreateSourceProgram {
    const TAG: PacketTag = PacketTag::CreateSourceProgram;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u16(self.context).await?;
        write_string(stream, &self.source).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            context: stream.read_u16().await?,
            source: read_string(stream).await?,
        })
    }
}

id_packet!(
    /// Creates a program from device binaries. Carries the parent context;
    /// the device `IdList` and one payload per device binary follow, and
    /// the reply is the program `Id` plus a `Payload<u16>` of per-device
    /// status codes.
    CreateBinaryProgram,
    CreateBinaryProgram
);

/// Builds a program. A device `IdList` follows this packet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildProgram {
    pub program: ObjectId,
    pub options: String,
}

impl Packet for BuildProgram {
    const TAG: PacketTag = PacketTag::BuildProgram;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u16(self.program).await?;
        write_string(stream, &self.options).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            program: stream.read_u16().await?,
            options: read_string(stream).await?,
        })
    }
}

/// A program build-info query; answered with a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub param: u32,
    pub program: ObjectId,
    pub device: ObjectId,
}

impl Packet for BuildInfo {
    const TAG: PacketTag = PacketTag::BuildInfo;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u32(self.param).await?;
        stream.write_u16(self.program).await?;
        stream.write_u16(self.device).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            param: stream.read_u32().await?,
            program: stream.read_u16().await?,
            device: stream.read_u16().await?,
        })
    }
}

id_param_packet!(
    /// A program info query; answered with a payload, an `Id` (context), an
    /// `IdList` (devices) or a binary-count scalar followed by one payload
    /// per binary.
    ProgramInfo,
    ProgramInfo
);
