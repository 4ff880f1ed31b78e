//! The closed set of packet tags exchanged over a connection.

/// Identifies the body layout of a packet. The tag is the first byte of
/// every packet; values are part of the wire contract and must not be
/// reordered.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketTag {
    /// Protocol version and feature handshake.
    Version = 0,
    /// An opaque data burst.
    Payload = 1,
    /// The command completed and no return value was expected.
    Success = 2,
    /// The command failed; carries the host-API status code.
    Error = 3,

    // Reference counting.
    Retain = 4,
    Release = 5,

    // Contexts.
    CreateContext = 6,
    CreateContextFromType = 7,
    GetContextInfo = 8,
    GetImageFormats = 9,

    // Command queues.
    CreateQueue = 10,
    CreateQueueWithProp = 11,
    GetQueueInfo = 12,
    Flush = 13,
    Finish = 14,

    // Programs.
    CreateSourceProgram = 15,
    CreateBinaryProgram = 16,
    BuildProgram = 17,
    BuildInfo = 18,
    ProgramInfo = 19,

    // Kernels.
    CreateKernel = 20,
    CreateKernels = 21,
    CloneKernel = 22,
    SetKernelArg = 23,
    KernelWGInfo = 24,
    KernelInfo = 25,
    KernelArgInfo = 26,

    // Buffers.
    CreateBuffer = 27,
    CreateSubBuffer = 28,
    ReadBuffer = 29,
    ReadBufferRect = 30,
    WriteBuffer = 31,
    FillBuffer = 32,
    GetMemObjInfo = 33,

    // Images.
    CreateImage = 34,
    ReadImage = 35,
    WriteImage = 36,
    GetImageInfo = 37,

    // Commands.
    EnqueueKernel = 38,

    // Events.
    CreateUserEvent = 39,
    SetUserEventStatus = 40,
    GetEventInfo = 41,
    GetEventProfilingInfo = 42,
    WaitEvents = 43,

    // Platforms and devices.
    GetPlatformInfo = 44,
    GetPlatformIDs = 45,
    GetDeviceIDs = 46,
    GetDeviceInfo = 47,

    /// A single object ID.
    Id = 48,
    /// A list of object IDs.
    IdList = 49,

    // Event stream.
    EventStreamOpen = 50,
    CallbackTrigger = 51,
    RegisterEventCallback = 52,
    EventCallbackTrigger = 53,

    /// Graceful close; also synthesized locally when the socket reaches EOF.
    Terminate = 0xFF,
}

impl PacketTag {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Version,
            1 => Self::Payload,
            2 => Self::Success,
            3 => Self::Error,
            4 => Self::Retain,
            5 => Self::Release,
            6 => Self::CreateContext,
            7 => Self::CreateContextFromType,
            8 => Self::GetContextInfo,
            9 => Self::GetImageFormats,
            10 => Self::CreateQueue,
            11 => Self::CreateQueueWithProp,
            12 => Self::GetQueueInfo,
            13 => Self::Flush,
            14 => Self::Finish,
            15 => Self::CreateSourceProgram,
            16 => Self::CreateBinaryProgram,
            17 => Self::BuildProgram,
            18 => Self::BuildInfo,
            19 => Self::ProgramInfo,
            20 => Self::CreateKernel,
            21 => Self::CreateKernels,
            22 => Self::CloneKernel,
            23 => Self::SetKernelArg,
            24 => Self::KernelWGInfo,
            25 => Self::KernelInfo,
            26 => Self::KernelArgInfo,
            27 => Self::CreateBuffer,
            28 => Self::CreateSubBuffer,
            29 => Self::ReadBuffer,
            30 => Self::ReadBufferRect,
            31 => Self::WriteBuffer,
            32 => Self::FillBuffer,
            33 => Self::GetMemObjInfo,
            34 => Self::CreateImage,
            35 => Self::ReadImage,
            36 => Self::WriteImage,
            37 => Self::GetImageInfo,
            38 => Self::EnqueueKernel,
            39 => Self::CreateUserEvent,
            40 => Self::SetUserEventStatus,
            41 => Self::GetEventInfo,
            42 => Self::GetEventProfilingInfo,
            43 => Self::WaitEvents,
            44 => Self::GetPlatformInfo,
            45 => Self::GetPlatformIDs,
            46 => Self::GetDeviceIDs,
            47 => Self::GetDeviceInfo,
            48 => Self::Id,
            49 => Self::IdList,
            50 => Self::EventStreamOpen,
            51 => Self::CallbackTrigger,
            52 => Self::RegisterEventCallback,
            53 => Self::EventCallbackTrigger,
            0xFF => Self::Terminate,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_roundtrip_through_u8() {
        for value in 0..=53u8 {
            let tag = PacketTag::from_u8(value).unwrap();
            assert_eq!(tag as u8, value);
        }
        assert_eq!(PacketTag::from_u8(0xFF), Some(PacketTag::Terminate));
    }

    #[test]
    fn unassigned_values_are_rejected() {
        assert_eq!(PacketTag::from_u8(54), None);
        assert_eq!(PacketTag::from_u8(0xFE), None);
    }
}
