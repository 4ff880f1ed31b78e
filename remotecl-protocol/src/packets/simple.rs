//! Control packets: success, error, terminate, single IDs and ID lists.

use crate::error::TransportError;
use crate::packet::Packet;
use crate::stream::ByteStream;
use crate::tag::PacketTag;
use crate::wire::{read_seq, write_seq};
use crate::ObjectId;

/// Declares a packet with no body.
macro_rules! signal_packet {
    ($(#[$doc:meta])* $name:ident, $tag:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl $crate::packet::Packet for $name {
            const TAG: $crate::tag::PacketTag = $crate::tag::PacketTag::$tag;

            async fn write_body(
                &self,
                _stream: &mut $crate::stream::ByteStream,
            ) -> Result<(), $crate::error::TransportError> {
                Ok(())
            }

            async fn read_body(
                _stream: &mut $crate::stream::ByteStream,
            ) -> Result<Self, $crate::error::TransportError> {
                Ok(Self)
            }
        }
    };
}

pub(crate) use signal_packet;

/// Declares an info-query packet pairing a parameter name with an object
/// ID. The parameter serializes first.
macro_rules! id_param_packet {
    ($(#[$doc:meta])* $name:ident, $tag:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            pub param: u32,
            pub id: $crate::ObjectId,
        }

        impl $crate::packet::Packet for $name {
            const TAG: $crate::tag::PacketTag = $crate::tag::PacketTag::$tag;

            async fn write_body(
                &self,
                stream: &mut $crate::stream::ByteStream,
            ) -> Result<(), $crate::error::TransportError> {
                stream.write_u32(self.param).await?;
                stream.write_u16(self.id).await
            }

            async fn read_body(
                stream: &mut $crate::stream::ByteStream,
            ) -> Result<Self, $crate::error::TransportError> {
                Ok(Self {
                    param: stream.read_u32().await?,
                    id: stream.read_u16().await?,
                })
            }
        }
    };
}

pub(crate) use id_param_packet;

/// Declares a packet whose body is a single object ID.
macro_rules! id_packet {
    ($(#[$doc:meta])* $name:ident, $tag:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub $crate::ObjectId);

        impl $crate::packet::Packet for $name {
            const TAG: $crate::tag::PacketTag = $crate::tag::PacketTag::$tag;

            async fn write_body(
                &self,
                stream: &mut $crate::stream::ByteStream,
            ) -> Result<(), $crate::error::TransportError> {
                stream.write_u16(self.0).await
            }

            async fn read_body(
                stream: &mut $crate::stream::ByteStream,
            ) -> Result<Self, $crate::error::TransportError> {
                Ok(Self(stream.read_u16().await?))
            }
        }
    };
}

pub(crate) use id_packet;

signal_packet!(
    /// The command completed successfully and no return value was expected.
    SuccessPacket,
    Success
);

signal_packet!(
    /// Announces that the connection is about to close.
    TerminatePacket,
    Terminate
);

/// Carries the host-API status code of a failed command. Receivers promote
/// this packet to an error instead of returning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPacket(pub i32);

impl Packet for ErrorPacket {
    const TAG: PacketTag = PacketTag::Error;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_i32(self.0).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self(stream.read_i32().await?))
    }
}

/// A single object ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPacket(pub ObjectId);

impl Packet for IdPacket {
    const TAG: PacketTag = PacketTag::Id;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_u16(self.0).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self(stream.read_u16().await?))
    }
}

/// A list of object IDs with a one-byte length prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdListPacket {
    pub ids: Vec<ObjectId>,
}

impl Packet for IdListPacket {
    const TAG: PacketTag = PacketTag::IdList;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        write_seq::<u8, ObjectId>(stream, &self.ids).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self {
            ids: read_seq::<u8, ObjectId>(stream).await?,
        })
    }
}
