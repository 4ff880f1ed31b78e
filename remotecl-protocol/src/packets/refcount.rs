//! Reference-count manipulation and the object-kind vocabulary.

use crate::error::TransportError;
use crate::packet::Packet;
use crate::stream::ByteStream;
use crate::tag::PacketTag;
use crate::ObjectId;

/// The kinds of remoted objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Platform,
    Device,
    Context,
    Queue,
    Program,
    Kernel,
    Memory,
    Event,
}

impl ObjectKind {
    /// The one-letter wire encoding used by retain/release. Platforms are
    /// not reference counted and have no letter.
    pub fn ref_letter(self) -> Option<u8> {
        Some(match self {
            ObjectKind::Platform => return None,
            ObjectKind::Device => b'D',
            ObjectKind::Context => b'C',
            ObjectKind::Queue => b'Q',
            ObjectKind::Program => b'P',
            ObjectKind::Kernel => b'K',
            ObjectKind::Memory => b'M',
            ObjectKind::Event => b'E',
        })
    }

    pub fn from_ref_letter(letter: u8) -> Option<Self> {
        Some(match letter {
            b'D' => ObjectKind::Device,
            b'C' => ObjectKind::Context,
            b'Q' => ObjectKind::Queue,
            b'P' => ObjectKind::Program,
            b'K' => ObjectKind::Kernel,
            b'M' => ObjectKind::Memory,
            b'E' => ObjectKind::Event,
            _ => return None,
        })
    }
}

macro_rules! refcount_packet {
    ($(#[$doc:meta])* $name:ident, $tag:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            pub kind: ObjectKind,
            pub id: ObjectId,
        }

        impl Packet for $name {
            const TAG: PacketTag = PacketTag::$tag;

            async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
                // Unknown kinds cannot be constructed, so the letter always
                // exists for refcounted objects; platforms fall back to 'U'
                // and the server rejects them.
                stream.write_u8(self.kind.ref_letter().unwrap_or(b'U')).await?;
                stream.write_u16(self.id).await
            }

            async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
                let letter = stream.read_u8().await?;
                let id = stream.read_u16().await?;
                let kind = ObjectKind::from_ref_letter(letter).unwrap_or(ObjectKind::Platform);
                Ok(Self { kind, id })
            }
        }
    };
}

refcount_packet!(
    /// Increments the reference count of a remoted object.
    RetainPacket,
    Retain
);

refcount_packet!(
    /// Decrements the reference count of a remoted object. The server-side
    /// handle-table entry stays in place even when the native object dies.
    ReleasePacket,
    Release
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_roundtrip() {
        for kind in [
            ObjectKind::Device,
            ObjectKind::Context,
            ObjectKind::Queue,
            ObjectKind::Program,
            ObjectKind::Kernel,
            ObjectKind::Memory,
            ObjectKind::Event,
        ] {
            let letter = kind.ref_letter().unwrap();
            assert_eq!(ObjectKind::from_ref_letter(letter), Some(kind));
        }
    }

    #[test]
    fn platforms_are_not_refcounted() {
        assert_eq!(ObjectKind::Platform.ref_letter(), None);
        assert_eq!(ObjectKind::from_ref_letter(b'U'), None);
    }
}
