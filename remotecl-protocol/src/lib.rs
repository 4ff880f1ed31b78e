//! # remotecl-protocol
//!
//! Wire protocol implementation for remotecl.
//!
//! This crate provides:
//! - A buffered byte stream with typed little-endian primitive I/O
//! - The serialization vocabulary (scalars, strings, length-prefixed
//!   sequences, fixed arrays)
//! - The closed packet-tag enumeration and one body type per tag
//! - Payload bursts with optional zlib compression
//! - The packet stream with in-band error promotion
//! - The 64-byte version/feature handshake packet

pub mod error;
pub mod packet;
pub mod packet_stream;
pub mod packets;
pub mod payload;
pub mod status;
pub mod stream;
pub mod tag;
pub mod version;
pub mod wire;

pub use error::{ProtocolError, TransportError};
pub use packet::Packet;
pub use packet_stream::PacketStream;
pub use stream::ByteStream;
pub use tag::PacketTag;
pub use version::VersionPacket;

/// The integer type used for object IDs on the wire.
///
/// A small type keeps packets compact on slow links at the cost of limiting
/// how many objects a connection can allocate. Its size is part of the
/// version handshake; peers with mismatching sizes refuse to connect.
pub type ObjectId = u16;

/// Sentinel ID meaning "absent" where an ID is optional. Never assigned to
/// a live object.
pub const NULL_ID: ObjectId = 0;

/// Protocol version, major part. Must match exactly between peers.
pub const VERSION_MAJOR: u8 = 1;

/// Protocol version, minor part. Must match exactly between peers.
pub const VERSION_MINOR: u8 = 0;

/// Default TCP port for the remotecl server.
pub const DEFAULT_PORT: u16 = 23857;

/// Payloads at or above this size are candidates for compression.
pub const COMPRESSION_THRESHOLD: usize = 1 << 20;
