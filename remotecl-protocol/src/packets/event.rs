//! User events, event queries and the out-of-band callback packets.

use crate::error::TransportError;
use crate::packet::Packet;
use crate::packets::simple::{id_packet, id_param_packet, signal_packet};
use crate::stream::ByteStream;
use crate::tag::PacketTag;
use crate::ObjectId;

id_packet!(
    /// Creates a user event in a context; answered with the event `Id`.
    CreateUserEvent,
    CreateUserEvent
);

/// Sets the execution status of a user event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetUserEventStatus {
    pub status: u32,
    pub id: ObjectId,
}

impl Packet for SetUserEventStatus {
    const TAG: PacketTag = PacketTag::SetUserEventStatus;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u32(self.status).await?;
        stream.write_u16(self.id).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            status: stream.read_u32().await?,
            id: stream.read_u16().await?,
        })
    }
}

id_param_packet!(
    /// An event info query; answered with a scalar payload or an `Id` for
    /// the context/queue parameters.
    GetEventInfo,
    GetEventInfo
);

id_param_packet!(
    /// An event profiling query; answered with a `u64` scalar payload.
    GetEventProfilingInfo,
    GetEventProfilingInfo
);

signal_packet!(
    /// Blocks until a set of events completes. An `IdList` of the events
    /// follows this packet; the answer is `Success`.
    WaitEvents,
    WaitEvents
);

signal_packet!(
    /// Asks the server to open an event stream. The answer is a
    /// `PayloadValue<u16>` with the port to connect to, or 0 when the
    /// server could not open one.
    OpenEventStream,
    EventStreamOpen
);

/// Event-stream packet: names the callback-registry slot about to fire.
/// An [`EventCallbackTrigger`] with the execution status follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackTrigger(pub u32);

impl Packet for CallbackTrigger {
    const TAG: PacketTag = PacketTag::CallbackTrigger;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u32(self.0).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self(stream.read_u32().await?))
    }
}

/// Registers a completion callback for an event. The callback ID is the
/// client's registry slot index; the server hands it back through
/// [`CallbackTrigger`] when the native callback fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterEventCallback {
    pub event: ObjectId,
    pub callback_id: u32,
    pub callback_type: u32,
}

impl Packet for RegisterEventCallback {
    const TAG: PacketTag = PacketTag::RegisterEventCallback;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u16(self.event).await?;
        stream.write_u32(self.callback_id).await?;
        stream.write_u32(self.callback_type).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            event: stream.read_u16().await?,
            callback_id: stream.read_u32().await?,
            callback_type: stream.read_u32().await?,
        })
    }
}

/// Event-stream packet: the execution status for a fired callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventCallbackTrigger(pub i32);

impl Packet for EventCallbackTrigger {
    const TAG: PacketTag = PacketTag::EventCallbackTrigger;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_i32(self.0).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self(stream.read_i32().await?))
    }
}
