//! Serialization vocabulary: scalars, strings, fixed arrays and
//! length-prefixed sequences.
//!
//! Sequences and strings carry a length prefix; the prefix width is chosen
//! per packet field (8, 16 or 32 bits) to save wire bytes on known-small
//! sequences. Encoding refuses a sequence whose length overflows the chosen
//! prefix.

use crate::error::TransportError;
use crate::stream::{alloc_bytes, ByteStream};

/// A fixed-width integer that can cross the wire.
#[allow(async_fn_in_trait)]
pub trait WireScalar: Copy + Send + Sized {
    async fn read(stream: &mut ByteStream) -> Result<Self, TransportError>;
    async fn write(self, stream: &mut ByteStream) -> Result<(), TransportError>;
}

macro_rules! impl_wire_scalar {
    ($ty:ty, $read:ident, $write:ident) => {
        impl WireScalar for $ty {
            async fn read(stream: &mut ByteStream) -> Result<Self, TransportError> {
                stream.$read().await
            }

            async fn write(self, stream: &mut ByteStream) -> Result<(), TransportError> {
                stream.$write(self).await
            }
        }
    };
}

impl_wire_scalar!(u8, read_u8, write_u8);
impl_wire_scalar!(u16, read_u16, write_u16);
impl_wire_scalar!(u32, read_u32, write_u32);
impl_wire_scalar!(u64, read_u64, write_u64);
impl_wire_scalar!(i32, read_i32, write_i32);

/// A scalar usable as a sequence length prefix.
pub trait LenPrefix: WireScalar {
    const MAX: u64;

    fn from_len(len: usize) -> Option<Self>;
    fn to_len(self) -> usize;
}

macro_rules! impl_len_prefix {
    ($ty:ty) => {
        impl LenPrefix for $ty {
            const MAX: u64 = <$ty>::MAX as u64;

            fn from_len(len: usize) -> Option<Self> {
                <$ty>::try_from(len).ok()
            }

            fn to_len(self) -> usize {
                self as usize
            }
        }
    };
}

impl_len_prefix!(u8);
impl_len_prefix!(u16);
impl_len_prefix!(u32);

/// Writes a length-prefixed sequence of scalars.
pub async fn write_seq<L: LenPrefix, T: WireScalar>(
    stream: &mut ByteStream,
    items: &[T],
) -> Result<(), TransportError> {
    let len = L::from_len(items.len()).ok_or(TransportError::SequenceTooLong {
        len: items.len(),
        max: L::MAX,
    })?;
    len.write(stream).await?;
    for &item in items {
        item.write(stream).await?;
    }
    Ok(())
}

/// Reads a length-prefixed sequence of scalars.
pub async fn read_seq<L: LenPrefix, T: WireScalar>(
    stream: &mut ByteStream,
) -> Result<Vec<T>, TransportError> {
    let len = L::read(stream).await?.to_len();
    let mut items = Vec::new();
    items
        .try_reserve_exact(len)
        .map_err(|_| TransportError::Allocation {
            bytes: len * std::mem::size_of::<T>(),
        })?;
    for _ in 0..len {
        items.push(T::read(stream).await?);
    }
    Ok(items)
}

/// Writes a string as a `u16` length followed by its bytes.
pub async fn write_string(stream: &mut ByteStream, text: &str) -> Result<(), TransportError> {
    let len = u16::from_len(text.len()).ok_or(TransportError::SequenceTooLong {
        len: text.len(),
        max: u16::MAX as u64,
    })?;
    stream.write_u16(len).await?;
    stream.write_all(text.as_bytes()).await
}

/// Reads a `u16`-length-prefixed string. Invalid UTF-8 is replaced rather
/// than rejected; the host API treats these as opaque byte strings.
pub async fn read_string(stream: &mut ByteStream) -> Result<String, TransportError> {
    let len = stream.read_u16().await? as usize;
    let mut buf = alloc_bytes(len)?;
    stream.read_exact(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Writes a fixed array with no length prefix.
pub async fn write_array<T: WireScalar, const N: usize>(
    stream: &mut ByteStream,
    items: &[T; N],
) -> Result<(), TransportError> {
    for &item in items {
        item.write(stream).await?;
    }
    Ok(())
}

/// Reads a fixed array with no length prefix.
pub async fn read_array<T: WireScalar + Default, const N: usize>(
    stream: &mut ByteStream,
) -> Result<[T; N], TransportError> {
    let mut items = [T::default(); N];
    for item in items.iter_mut() {
        *item = T::read(stream).await?;
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (ByteStream, ByteStream) {
        let (a, b) = tokio::io::duplex(64 * 1024);
        let (ar, aw) = tokio::io::split(a);
        let (br, bw) = tokio::io::split(b);
        (
            ByteStream::from_parts(Box::new(ar), Box::new(aw)),
            ByteStream::from_parts(Box::new(br), Box::new(bw)),
        )
    }

    #[tokio::test]
    async fn seq_roundtrip_with_u8_prefix() {
        let (mut tx, mut rx) = pair();
        let ids: Vec<u16> = vec![7, 9, 12];
        write_seq::<u8, u16>(&mut tx, &ids).await.unwrap();
        tx.flush().await.unwrap();
        assert_eq!(read_seq::<u8, u16>(&mut rx).await.unwrap(), ids);
    }

    #[tokio::test]
    async fn empty_seq_is_only_the_prefix() {
        let (mut tx, mut rx) = pair();
        write_seq::<u8, u64>(&mut tx, &[]).await.unwrap();
        tx.flush().await.unwrap();
        assert_eq!(rx.read_u8().await.unwrap(), 0);
        drop(tx);
        assert_eq!(rx.peek().await, None);
    }

    #[tokio::test]
    async fn seq_refuses_prefix_overflow() {
        let (mut tx, _rx) = pair();
        let too_many: Vec<u16> = vec![0; 256];
        let err = write_seq::<u8, u16>(&mut tx, &too_many).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::SequenceTooLong { len: 256, max: 255 }
        ));
    }

    #[tokio::test]
    async fn max_length_seq_roundtrips() {
        let (mut tx, mut rx) = pair();
        let items: Vec<u8> = vec![0xAB; u8::MAX as usize];
        write_seq::<u8, u8>(&mut tx, &items).await.unwrap();
        tx.flush().await.unwrap();
        assert_eq!(read_seq::<u8, u8>(&mut rx).await.unwrap(), items);
    }

    #[tokio::test]
    async fn string_roundtrip() {
        let (mut tx, mut rx) = pair();
        write_string(&mut tx, "-cl-fast-relaxed-math").await.unwrap();
        write_string(&mut tx, "").await.unwrap();
        tx.flush().await.unwrap();
        assert_eq!(read_string(&mut rx).await.unwrap(), "-cl-fast-relaxed-math");
        assert_eq!(read_string(&mut rx).await.unwrap(), "");
    }

    #[tokio::test]
    async fn fixed_array_has_no_prefix() {
        let (mut tx, mut rx) = pair();
        write_array(&mut tx, &[1u32, 2, 3]).await.unwrap();
        tx.flush().await.unwrap();
        assert_eq!(rx.read_u32().await.unwrap(), 1);
        assert_eq!(read_array::<u32, 2>(&mut rx).await.unwrap(), [2, 3]);
    }
}
