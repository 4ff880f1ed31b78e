//! Packet bodies, one module per host-API family.
//!
//! Every body serializes its named fields in declaration order; layouts
//! are part of the wire contract.

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
pub mod simple;

pub use simple::{ErrorPacket, IdListPacket, IdPacket, SuccessPacket, TerminatePacket};
