//! The packet trait: a tag plus a self-delimiting body.

use crate::error::TransportError;
use crate::stream::ByteStream;
use crate::tag::PacketTag;

/// A typed packet body.
///
/// Bodies serialize their fields in declaration order with no framing of
/// their own; each body layout is self-delimiting, so there is no whole
/// packet length prefix on the wire.
#[allow(async_fn_in_trait)]
pub trait Packet: Sized + Send {
    const TAG: PacketTag;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError>;
    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError>;
}
