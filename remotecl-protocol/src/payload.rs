//! Opaque data bursts, optionally compressed.
//!
//! A payload body is `decompressed_size | data_size | bytes`, where both
//! sizes use the payload's length-prefix type. A zero decompressed size
//! means the bytes are raw. Compression is attempted only for bursts at or
//! above [`COMPRESSION_THRESHOLD`](crate::COMPRESSION_THRESHOLD) and kept
//! only when it actually shrinks the burst; the decision is local to the
//! sender.

use crate::error::TransportError;
use crate::packet::Packet;
use crate::stream::{alloc_bytes, ByteStream};
use crate::tag::PacketTag;
use crate::wire::{LenPrefix, WireScalar};
use crate::COMPRESSION_THRESHOLD;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use std::marker::PhantomData;

/// An owned data burst.
///
/// The prefix type defaults to `u32`; smaller prefixes reduce wire overhead
/// for payloads known to be small.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload<L: LenPrefix = u32> {
    pub data: Vec<u8>,
    _prefix: PhantomData<L>,
}

impl<L: LenPrefix> Payload<L> {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            _prefix: PhantomData,
        }
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

fn deflate(data: &[u8]) -> Option<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).ok()?;
    encoder.finish().ok()
}

fn inflate(compressed: &[u8], decompressed_len: usize) -> Result<Vec<u8>, TransportError> {
    let mut out = alloc_bytes(decompressed_len)?;
    let mut decoder = ZlibDecoder::new(compressed);
    decoder
        .read_exact(&mut out)
        .map_err(|_| TransportError::Decompress)?;
    Ok(out)
}

fn encode_len<L: LenPrefix>(len: usize) -> Result<L, TransportError> {
    L::from_len(len).ok_or(TransportError::SequenceTooLong {
        len,
        max: L::MAX,
    })
}

impl<L: LenPrefix> Packet for Payload<L> {
    const TAG: PacketTag = PacketTag::Payload;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        if self.data.len() >= COMPRESSION_THRESHOLD {
            if let Some(compressed) = deflate(&self.data) {
                if !compressed.is_empty() && compressed.len() < self.data.len() {
                    encode_len::<L>(self.data.len())?.write(stream).await?;
                    encode_len::<L>(compressed.len())?.write(stream).await?;
                    return stream.write_all(&compressed).await;
                }
            }
        }

        encode_len::<L>(0)?.write(stream).await?;
        encode_len::<L>(self.data.len())?.write(stream).await?;
        stream.write_all(&self.data).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        let decompressed_len = L::read(stream).await?.to_len();
        let data_len = L::read(stream).await?.to_len();

        let mut data = alloc_bytes(data_len)?;
        stream.read_exact(&mut data).await?;

        if decompressed_len != 0 {
            data = inflate(&data, decompressed_len)?;
        }
        Ok(Self::new(data))
    }
}

/// A single little-endian scalar carried under the `Payload` tag.
///
/// Scalar bursts are protocol-structural replies (the kernel-argument
/// discriminator, the event-stream port, image byte counts); they never
/// carry the compression wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadValue<T: WireScalar>(pub T);

impl<T: WireScalar> Packet for PayloadValue<T> {
    const TAG: PacketTag = PacketTag::Payload;

    async fn write_body(&self, stream: &mut ByteStream) -> Result<(), TransportError> {
        self.0.write(stream).await
    }

    async fn read_body(stream: &mut ByteStream) -> Result<Self, TransportError> {
        Ok(Self(T::read(stream).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (ByteStream, ByteStream) {
        let (a, b) = tokio::io::duplex(16 * 1024 * 1024);
        let (ar, aw) = tokio::io::split(a);
        let (br, bw) = tokio::io::split(b);
        (
            ByteStream::from_parts(Box::new(ar), Box::new(aw)),
            ByteStream::from_parts(Box::new(br), Box::new(bw)),
        )
    }

    #[tokio::test]
    async fn small_payload_is_sent_raw() {
        let (mut tx, mut rx) = pair();
        let payload: Payload = Payload::new(vec![1, 2, 3, 4]);
        payload.write_body(&mut tx).await.unwrap();
        tx.flush().await.unwrap();

        // Zero decompressed size marks a raw burst.
        assert_eq!(rx.read_u32().await.unwrap(), 0);
        assert_eq!(rx.read_u32().await.unwrap(), 4);
        let mut raw = [0u8; 4];
        rx.read_exact(&mut raw).await.unwrap();
        assert_eq!(raw, [1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn empty_payload_roundtrips() {
        let (mut tx, mut rx) = pair();
        let payload: Payload = Payload::new(Vec::new());
        payload.write_body(&mut tx).await.unwrap();
        tx.flush().await.unwrap();
        let got: Payload = Payload::read_body(&mut rx).await.unwrap();
        assert!(got.data.is_empty());
    }

    #[tokio::test]
    async fn compressed_payload_roundtrips() {
        let (mut tx, mut rx) = pair();
        // Highly compressible and over the threshold.
        let data = vec![0x5Au8; COMPRESSION_THRESHOLD + 17];
        let payload: Payload = Payload::new(data.clone());

        let writer = tokio::spawn(async move {
            payload.write_body(&mut tx).await.unwrap();
            tx.flush().await.unwrap();
            tx
        });

        let got: Payload = Payload::read_body(&mut rx).await.unwrap();
        assert_eq!(got.data, data);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn compressed_payload_is_smaller_on_the_wire() {
        let data = vec![0u8; COMPRESSION_THRESHOLD];
        let compressed = deflate(&data).unwrap();
        assert!(compressed.len() < data.len());
    }

    #[tokio::test]
    async fn incompressible_large_payload_roundtrips() {
        let (mut tx, mut rx) = pair();
        // A simple PRNG fill defeats the compressor.
        let mut state = 0x12345678u32;
        let data: Vec<u8> = (0..COMPRESSION_THRESHOLD + 3)
            .map(|_| {
                state = state.wrapping_mul(1664525).wrapping_add(1013904223);
                (state >> 24) as u8
            })
            .collect();
        let expected = data.clone();
        let payload: Payload = Payload::new(data);

        let writer = tokio::spawn(async move {
            payload.write_body(&mut tx).await.unwrap();
            tx.flush().await.unwrap();
            tx
        });

        let got: Payload = Payload::read_body(&mut rx).await.unwrap();
        assert_eq!(got.data, expected);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn u16_prefix_refuses_oversized_payload() {
        let (mut tx, _rx) = pair();
        let payload: Payload<u16> = Payload::new(vec![0; u16::MAX as usize + 1]);
        let err = payload.write_body(&mut tx).await.unwrap_err();
        assert!(matches!(err, TransportError::SequenceTooLong { .. }));
    }

    #[tokio::test]
    async fn scalar_payload_has_no_wrapper() {
        let (mut tx, mut rx) = pair();
        PayloadValue(0x1234u16).write_body(&mut tx).await.unwrap();
        tx.flush().await.unwrap();
        drop(tx);
        assert_eq!(rx.read_u16().await.unwrap(), 0x1234);
        // The scalar is the entire body: two bytes, no size fields.
        assert_eq!(rx.peek().await, None);
    }
}
