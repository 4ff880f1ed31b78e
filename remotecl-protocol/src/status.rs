//! Host-API status codes carried in error packets and event triggers.
//!
//! These values are part of the wire contract: the server forwards them
//! verbatim from the native implementation and the client returns them
//! unchanged at the host-API boundary.

pub const SUCCESS: i32 = 0;
pub const DEVICE_NOT_FOUND: i32 = -1;
pub const DEVICE_NOT_AVAILABLE: i32 = -2;
pub const OUT_OF_RESOURCES: i32 = -5;
pub const OUT_OF_HOST_MEMORY: i32 = -6;

pub const INVALID_VALUE: i32 = -30;
pub const INVALID_DEVICE_TYPE: i32 = -31;
pub const INVALID_PLATFORM: i32 = -32;
pub const INVALID_DEVICE: i32 = -33;
pub const INVALID_CONTEXT: i32 = -34;
pub const INVALID_QUEUE_PROPERTIES: i32 = -35;
pub const INVALID_COMMAND_QUEUE: i32 = -36;
pub const INVALID_MEM_OBJECT: i32 = -38;
pub const INVALID_IMAGE_SIZE: i32 = -40;
pub const INVALID_BINARY: i32 = -42;
pub const INVALID_BUILD_OPTIONS: i32 = -43;
pub const INVALID_PROGRAM: i32 = -44;
pub const INVALID_PROGRAM_EXECUTABLE: i32 = -45;
pub const INVALID_KERNEL_NAME: i32 = -46;
pub const INVALID_KERNEL: i32 = -48;
pub const INVALID_ARG_INDEX: i32 = -49;
pub const INVALID_ARG_VALUE: i32 = -50;
pub const INVALID_ARG_SIZE: i32 = -51;
pub const INVALID_WORK_DIMENSION: i32 = -53;
pub const INVALID_EVENT_WAIT_LIST: i32 = -57;
pub const INVALID_EVENT: i32 = -58;
pub const INVALID_OPERATION: i32 = -59;
pub const INVALID_BUFFER_SIZE: i32 = -61;

/// Command execution statuses delivered through event callbacks.
pub mod execution {
    pub const COMPLETE: i32 = 0;
    pub const RUNNING: i32 = 1;
    pub const SUBMITTED: i32 = 2;
    pub const QUEUED: i32 = 3;
}
