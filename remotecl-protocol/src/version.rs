//! The version and feature handshake packet.
//!
//! A fixed 64-byte buffer: protocol major byte, minor byte, a space, the
//! declared ID size in bytes, then ASCII feature letters, then NUL. The
//! server sends its packet immediately on accept; the client reads and
//! compares before sending anything else.

use crate::error::TransportError;
use crate::packet::Packet;
use crate::stream::ByteStream;
use crate::tag::PacketTag;
use crate::{ObjectId, VERSION_MAJOR, VERSION_MINOR};

/// Feature letter: payload compression. Must match between peers — they
/// could not exchange payloads otherwise.
pub const FEATURE_COMPRESSION: u8 = b'z';

/// Feature letter: out-of-band event stream. May mismatch; the side
/// lacking it simply never negotiates the stream.
pub const FEATURE_EVENT_STREAM: u8 = b'e';

const SIZE: usize = 64;

/// The 64-byte version/feature packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionPacket {
    raw: [u8; SIZE],
}

impl Default for VersionPacket {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionPacket {
    /// Builds the packet describing this implementation.
    pub fn new() -> Self {
        let mut raw = [0u8; SIZE];
        let mut i = 0;
        raw[i] = VERSION_MAJOR;
        i += 1;
        raw[i] = VERSION_MINOR;
        i += 1;
        raw[i] = b' ';
        i += 1;
        raw[i] = std::mem::size_of::<ObjectId>() as u8;
        i += 1;
        raw[i] = FEATURE_COMPRESSION;
        i += 1;
        raw[i] = FEATURE_EVENT_STREAM;
        // The remainder of the buffer stays NUL.
        Self { raw }
    }

    fn major(&self) -> u8 {
        self.raw[0]
    }

    fn minor(&self) -> u8 {
        self.raw[1]
    }

    fn id_size(&self) -> u8 {
        self.raw[3]
    }

    fn features(&self) -> &[u8] {
        let tail = &self.raw[4..];
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        &tail[..end]
    }

    pub fn has_feature(&self, letter: u8) -> bool {
        self.features().contains(&letter)
    }

    /// Checks whether a connection with `other` can proceed.
    ///
    /// Version bytes and ID size must match exactly. Compression must match
    /// exactly. The event-stream letter is advisory.
    pub fn is_compatible_with(&self, other: &VersionPacket) -> bool {
        if self.major() != other.major() || self.minor() != other.minor() {
            return false;
        }
        if self.raw[2] != b' ' || other.raw[2] != b' ' {
            return false;
        }
        if self.id_size() != other.id_size() {
            return false;
        }
        if self.has_feature(FEATURE_COMPRESSION) != other.has_feature(FEATURE_COMPRESSION) {
            return false;
        }
        true
    }
}

impl Packet for VersionPacket {
    const TAG: PacketTag = PacketTag::Version;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        stream.write_all(&self.raw).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        let mut raw = [0u8; SIZE];
        stream.read_exact(&mut raw).await?;
        Ok(Self { raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet_with(major: u8, minor: u8, id_size: u8, features: &[u8]) -> VersionPacket {
        let mut p = VersionPacket::new();
        p.raw = [0u8; SIZE];
        p.raw[0] = major;
        p.raw[1] = minor;
        p.raw[2] = b' ';
        p.raw[3] = id_size;
        p.raw[4..4 + features.len()].copy_from_slice(features);
        p
    }

    #[test]
    fn current_version_is_self_compatible() {
        let a = VersionPacket::new();
        let b = VersionPacket::new();
        assert!(a.is_compatible_with(&b));
    }

    #[test]
    fn version_bytes_must_match() {
        let ours = VersionPacket::new();
        let newer = packet_with(VERSION_MAJOR + 1, VERSION_MINOR, 2, b"ze");
        assert!(!ours.is_compatible_with(&newer));

        let minor = packet_with(VERSION_MAJOR, VERSION_MINOR + 1, 2, b"ze");
        assert!(!ours.is_compatible_with(&minor));
    }

    #[test]
    fn id_size_must_match() {
        let ours = VersionPacket::new();
        let wide = packet_with(VERSION_MAJOR, VERSION_MINOR, 4, b"ze");
        assert!(!ours.is_compatible_with(&wide));
    }

    #[test]
    fn compression_must_match() {
        let ours = VersionPacket::new();
        let plain = packet_with(VERSION_MAJOR, VERSION_MINOR, 2, b"e");
        assert!(!ours.is_compatible_with(&plain));
    }

    #[test]
    fn event_stream_may_mismatch() {
        let ours = VersionPacket::new();
        let no_events = packet_with(VERSION_MAJOR, VERSION_MINOR, 2, b"z");
        assert!(ours.is_compatible_with(&no_events));
        assert!(!no_events.has_feature(FEATURE_EVENT_STREAM));
    }

    #[tokio::test]
    async fn fixed_size_on_the_wire() {
        let (a, b) = tokio::io::duplex(1024);
        let (ar, aw) = tokio::io::split(a);
        let (br, bw) = tokio::io::split(b);
        let mut tx = ByteStream::from_parts(Box::new(ar), Box::new(aw));
        let mut rx = ByteStream::from_parts(Box::new(br), Box::new(bw));

        VersionPacket::new().write_body(&mut tx).await.unwrap();
        tx.flush().await.unwrap();
        drop(tx);

        let got = VersionPacket::read_body(&mut rx).await.unwrap();
        assert_eq!(got, VersionPacket::new());
        assert_eq!(rx.peek().await, None);
    }
}
