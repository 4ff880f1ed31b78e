//! The request/response packet channel.

use crate::error::{ProtocolError, TransportError};
use crate::packet::Packet;
use crate::stream::ByteStream;
use crate::tag::PacketTag;

/// Transfers typed packets across a byte stream.
///
/// The stream is not internally synchronized; callers provide mutual
/// exclusion (the client holds its connection mutex for a whole
/// request/response exchange, the server owns its stream from a single
/// dispatch loop).
pub struct PacketStream {
    stream: ByteStream,
}

impl PacketStream {
    pub fn new(stream: ByteStream) -> Self {
        Self { stream }
    }

    /// Writes the packet's tag and body. The bytes are staged; call
    /// [`flush`](Self::flush) to push them to the peer.
    pub async fn send<P: Packet>(&mut self, packet: &P) -> Result<(), TransportError> {
        self.stream.write_u8(P::TAG as u8).await?;
        packet.write_body(&mut self.stream).await
    }

    /// Reads the next packet, which must be a `P`.
    ///
    /// An incoming `Error` packet is promoted to
    /// [`ProtocolError::Remote`] with its status code, consuming exactly
    /// the error's tag and body. `Terminate` (sent by the peer or
    /// synthesized at EOF) becomes a transport error. Any other tag
    /// mismatch is a framing failure.
    pub async fn recv<P: Packet>(&mut self) -> Result<P, ProtocolError> {
        let raw = self.stream.read_u8().await.map_err(TransportError::from)?;
        let tag = PacketTag::from_u8(raw).ok_or(TransportError::UnknownTag(raw))?;

        if tag == PacketTag::Error {
            let code = self.stream.read_i32().await.map_err(TransportError::from)?;
            return Err(ProtocolError::Remote(code));
        }
        if tag == PacketTag::Terminate {
            return Err(TransportError::Terminated.into());
        }
        if tag != P::TAG {
            return Err(TransportError::UnexpectedPacket {
                expected: P::TAG,
                actual: tag,
            }
            .into());
        }
        Ok(P::read_body(&mut self.stream).await?)
    }

    /// Blocks until a packet is pending and returns its tag without
    /// consuming it. EOF and read errors report as `Terminate`.
    pub async fn next_tag(&mut self) -> Result<PacketTag, TransportError> {
        match self.stream.peek().await {
            None => Ok(PacketTag::Terminate),
            Some(raw) => PacketTag::from_u8(raw).ok_or(TransportError::UnknownTag(raw)),
        }
    }

    pub async fn flush(&mut self) -> Result<(), TransportError> {
        self.stream.flush().await
    }

    pub async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.stream.shutdown().await
    }

    /// The underlying byte stream, for bodies that span several packets.
    pub fn inner(&mut self) -> &mut ByteStream {
        &mut self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::simple::{ErrorPacket, IdPacket, SuccessPacket};

    fn pair() -> (PacketStream, PacketStream) {
        let (a, b) = tokio::io::duplex(64 * 1024);
        let (ar, aw) = tokio::io::split(a);
        let (br, bw) = tokio::io::split(b);
        (
            PacketStream::new(ByteStream::from_parts(Box::new(ar), Box::new(aw))),
            PacketStream::new(ByteStream::from_parts(Box::new(br), Box::new(bw))),
        )
    }

    #[tokio::test]
    async fn first_byte_is_the_tag() {
        let (mut tx, mut rx) = pair();
        tx.send(&IdPacket(12)).await.unwrap();
        tx.flush().await.unwrap();
        assert_eq!(rx.inner().read_u8().await.unwrap(), PacketTag::Id as u8);
        assert_eq!(rx.inner().read_u16().await.unwrap(), 12);
    }

    #[tokio::test]
    async fn recv_refuses_mismatched_tag() {
        let (mut tx, mut rx) = pair();
        tx.send(&SuccessPacket).await.unwrap();
        tx.flush().await.unwrap();

        let err = rx.recv::<IdPacket>().await.unwrap_err();
        match err {
            ProtocolError::Transport(TransportError::UnexpectedPacket { expected, actual }) => {
                assert_eq!(expected, PacketTag::Id);
                assert_eq!(actual, PacketTag::Success);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_packet_is_promoted_and_fully_consumed() {
        let (mut tx, mut rx) = pair();
        tx.send(&ErrorPacket(-31)).await.unwrap();
        tx.send(&SuccessPacket).await.unwrap();
        tx.flush().await.unwrap();

        match rx.recv::<IdPacket>().await.unwrap_err() {
            ProtocolError::Remote(code) => assert_eq!(code, -31),
            other => panic!("unexpected error: {other:?}"),
        }
        // Exactly one tag+body was consumed; the next packet is intact.
        rx.recv::<SuccessPacket>().await.unwrap();
    }

    #[tokio::test]
    async fn next_tag_peeks_without_consuming() {
        let (mut tx, mut rx) = pair();
        tx.send(&IdPacket(7)).await.unwrap();
        tx.flush().await.unwrap();

        assert_eq!(rx.next_tag().await.unwrap(), PacketTag::Id);
        assert_eq!(rx.next_tag().await.unwrap(), PacketTag::Id);
        assert_eq!(rx.recv::<IdPacket>().await.unwrap().0, 7);
    }

    #[tokio::test]
    async fn eof_reads_as_terminate() {
        let (tx, mut rx) = pair();
        drop(tx);
        assert_eq!(rx.next_tag().await.unwrap(), PacketTag::Terminate);
    }

    #[tokio::test]
    async fn terminate_packet_is_a_transport_error() {
        let (mut tx, mut rx) = pair();
        tx.send(&crate::packets::simple::TerminatePacket).await.unwrap();
        tx.flush().await.unwrap();

        let err = rx.recv::<SuccessPacket>().await.unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Transport(TransportError::Terminated)
        ));
    }
}
