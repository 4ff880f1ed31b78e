//! # remotecl-client
//!
//! Client side of the remotecl remoting layer: a connection that forwards
//! host-API calls as typed packets, an object registry whose proxies double
//! as host-API opaque handles, and an out-of-band event-callback receiver.
//!
//! The process-wide singleton and the C ABI surface bindings live above
//! this crate; everything here is constructed through factories so tests
//! can substitute transports.

pub mod calls;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod mapping;
pub mod registry;

pub use calls::InfoReply;
pub use config::ClientConfig;
pub use connection::Connection;
pub use error::ClientError;
pub use mapping::{Mapping, MAP_READ, MAP_WRITE};
pub use registry::{ObjectRegistry, Proxy, RawHandle};

pub use remotecl_protocol::packets::refcount::ObjectKind;
pub use remotecl_protocol::{status, ObjectId};
