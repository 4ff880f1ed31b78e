//! Kernel creation, argument setting, enqueue and queries.

use crate::error::TransportError;
use crate::packet::Packet;
use crate::packets::simple::{id_packet, id_param_packet};
use crate::stream::ByteStream;
use crate::tag::PacketTag;
use crate::wire::{read_array, read_string, write_array, write_string};
use crate::ObjectId;

/// Creates one named kernel from a built program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateKernel {
    pub program: ObjectId,
    pub name: String,
}

impl Packet for CreateKernel {
    const TAG: PacketTag = PacketTag::CreateKernel;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u16(self.program).await?;
        write_string(stream, &self.name).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            program: stream.read_u16().await?,
            name: read_string(stream).await?,
        })
    }
}

/// Creates every kernel in a program; answered with an `IdList`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateKernels {
    pub program: ObjectId,
    pub kernel_count: u32,
}

impl Packet for CreateKernels {
    const TAG: PacketTag = PacketTag::CreateKernels;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u16(self.program).await?;
        stream.write_u32(self.kernel_count).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            program: stream.read_u16().await?,
            kernel_count: stream.read_u32().await?,
        })
    }
}

id_packet!(
    /// Clones a kernel; answered with the clone's `Id`.
    CloneKernel,
    CloneKernel
);

/// Opens the kernel-argument negotiation.
///
/// The server inspects the argument's address space and replies with a
/// one-character discriminator payload: `'I'` asks for a memory-object
/// `Id`, `'S'` for a local-buffer byte count, `'P'` for a by-value
/// payload. The client answers accordingly and the server completes with
/// `Success` or an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelArg {
    pub kernel: ObjectId,
    pub arg_index: u32,
}

impl Packet for KernelArg {
    const TAG: PacketTag = PacketTag::SetKernelArg;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u16(self.kernel).await?;
        stream.write_u32(self.arg_index).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            kernel: stream.read_u16().await?,
            arg_index: stream.read_u32().await?,
        })
    }
}

/// A kernel work-group info query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelWGInfo {
    pub kernel: ObjectId,
    pub device: ObjectId,
    pub param: u32,
}

impl Packet for KernelWGInfo {
    const TAG: PacketTag = PacketTag::KernelWGInfo;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u16(self.kernel).await?;
        stream.write_u16(self.device).await?;
        stream.write_u32(self.param).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            kernel: stream.read_u16().await?,
            device: stream.read_u16().await?,
            param: stream.read_u32().await?,
        })
    }
}

id_param_packet!(
    /// A kernel info query; answered with a payload or an `Id` for the
    /// context/program parameters.
    KernelInfo,
    KernelInfo
);

/// A kernel argument info query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelArgInfo {
    pub kernel: ObjectId,
    pub arg_index: u32,
    pub param: u32,
}

impl Packet for KernelArgInfo {
    const TAG: PacketTag = PacketTag::KernelArgInfo;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u16(self.kernel).await?;
        stream.write_u32(self.arg_index).await?;
        stream.write_u32(self.param).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            kernel: stream.read_u16().await?,
            arg_index: stream.read_u32().await?,
            param: stream.read_u32().await?,
        })
    }
}

/// Enqueues an N-dimensional kernel execution.
///
/// A zero leading local size means the client left the work-group size
/// unspecified. When `expect_event_list` is set an `IdList` of wait
/// events follows this packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnqueueKernel {
    pub kernel: ObjectId,
    pub queue: ObjectId,
    pub work_dim: u8,
    pub global_size: [u32; 3],
    pub global_offset: [u32; 3],
    pub local_size: [u32; 3],
    pub want_event: bool,
    pub expect_event_list: bool,
}

impl Packet for EnqueueKernel {
    const TAG: PacketTag = PacketTag::EnqueueKernel;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u16(self.kernel).await?;
        stream.write_u16(self.queue).await?;
        stream.write_u8(self.work_dim).await?;
        write_array(stream, &self.global_size).await?;
        write_array(stream, &self.global_offset).await?;
        write_array(stream, &self.local_size).await?;
        stream.write_bool(self.want_event).await?;
        stream.write_bool(self.expect_event_list).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            kernel: stream.read_u16().await?,
            queue: stream.read_u16().await?,
            work_dim: stream.read_u8().await?,
            global_size: read_array(stream).await?,
            global_offset: read_array(stream).await?,
            local_size: read_array(stream).await?,
            want_event: stream.read_bool().await?,
            expect_event_list: stream.read_bool().await?,
        })
    }
}

/// The kernel-argument discriminators the server may answer with.
pub mod arg_kind {
    /// The argument is a memory object; send its ID.
    pub const MEM_OBJECT: u8 = b'I';
    /// The argument is local memory; send a byte count.
    pub const LOCAL: u8 = b'S';
    /// The argument is passed by value; send a payload.
    pub const BY_VALUE: u8 = b'P';
}
