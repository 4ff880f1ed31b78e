//! Request handlers, grouped by host-API family.
//!
//! Each handler reads the remainder of its request (the dispatch loop has
//! only peeked the tag), performs the native call and writes exactly one
//! response, either the success shape its operation defines or an in-band
//! error packet.

mod context;
mod device;
mod event;
mod image;
mod kernel;
mod memory;
mod platform;
mod program;
mod queue;
mod refcount;
