//! Buffered byte stream over a network transport.
//!
//! Wraps a socket with staged read and write buffers so that a packet built
//! field-by-field turns into few socket operations. Blocks larger than the
//! buffer bypass the staging copy in both directions.

use crate::error::TransportError;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::io::{BufReader, BufWriter};
use tokio::net::TcpStream;

type Reader = BufReader<Box<dyn AsyncRead + Send + Unpin>>;
type Writer = BufWriter<Box<dyn AsyncWrite + Send + Unpin>>;

/// Size of the read and write buffers in bytes.
pub const BUFFER_SIZE: usize = 8 * 1024;

/// A buffered, typed byte stream.
///
/// All multi-byte integers are little-endian on the wire; the helpers here
/// are the only place byte order is decided.
pub struct ByteStream {
    reader: Reader,
    writer: Writer,
}

impl ByteStream {
    /// Wraps a connected TCP stream.
    pub fn from_tcp(stream: TcpStream) -> Self {
        // Request/response latency matters more than batching here.
        stream.set_nodelay(true).ok();
        let (read_half, write_half) = stream.into_split();
        Self::from_parts(Box::new(read_half), Box::new(write_half))
    }

    /// Builds a stream from any reader/writer pair.
    ///
    /// Tests substitute in-memory duplex transports through this
    /// constructor.
    pub fn from_parts(
        reader: Box<dyn AsyncRead + Send + Unpin>,
        writer: Box<dyn AsyncWrite + Send + Unpin>,
    ) -> Self {
        Self {
            reader: BufReader::with_capacity(BUFFER_SIZE, reader),
            writer: BufWriter::with_capacity(BUFFER_SIZE, writer),
        }
    }

    /// Previews the next incoming byte without consuming it.
    ///
    /// Returns `None` at EOF or on a read error; an orderly peer close is
    /// the normal termination signal and is not distinguishable here.
    pub async fn peek(&mut self) -> Option<u8> {
        match self.reader.fill_buf().await {
            Ok(buf) => buf.first().copied(),
            Err(_) => None,
        }
    }

    /// Flushes any staged write bytes to the transport.
    pub async fn flush(&mut self) -> Result<(), TransportError> {
        self.writer.flush().await?;
        Ok(())
    }

    pub async fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        self.reader.read_exact(buf).await?;
        Ok(())
    }

    pub async fn write_all(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        self.writer.write_all(buf).await?;
        Ok(())
    }

    pub async fn read_u8(&mut self) -> Result<u8, TransportError> {
        Ok(self.reader.read_u8().await?)
    }

    pub async fn read_u16(&mut self) -> Result<u16, TransportError> {
        Ok(self.reader.read_u16_le().await?)
    }

    pub async fn read_u32(&mut self) -> Result<u32, TransportError> {
        Ok(self.reader.read_u32_le().await?)
    }

    pub async fn read_u64(&mut self) -> Result<u64, TransportError> {
        Ok(self.reader.read_u64_le().await?)
    }

    pub async fn read_i32(&mut self) -> Result<i32, TransportError> {
        Ok(self.reader.read_i32_le().await?)
    }

    pub async fn read_bool(&mut self) -> Result<bool, TransportError> {
        Ok(self.read_u8().await? != 0)
    }

    pub async fn write_u8(&mut self, v: u8) -> Result<(), TransportError> {
        self.writer.write_u8(v).await?;
        Ok(())
    }

    pub async fn write_u16(&mut self, v: u16) -> Result<(), TransportError> {
        self.writer.write_u16_le(v).await?;
        Ok(())
    }

    pub async fn write_u32(&mut self, v: u32) -> Result<(), TransportError> {
        self.writer.write_u32_le(v).await?;
        Ok(())
    }

    pub async fn write_u64(&mut self, v: u64) -> Result<(), TransportError> {
        self.writer.write_u64_le(v).await?;
        Ok(())
    }

    pub async fn write_i32(&mut self, v: i32) -> Result<(), TransportError> {
        self.writer.write_i32_le(v).await?;
        Ok(())
    }

    pub async fn write_bool(&mut self, v: bool) -> Result<(), TransportError> {
        self.write_u8(v as u8).await
    }

    /// Shuts down the write side, flushing staged bytes first.
    pub async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// Allocates a zeroed byte vector, failing softly when the requested size
/// cannot be reserved. Every wire-controlled allocation goes through here
/// so a hostile length becomes an error instead of an abort.
pub fn alloc_bytes(len: usize) -> Result<Vec<u8>, TransportError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| TransportError::Allocation { bytes: len })?;
    buf.resize(len, 0);
    Ok(buf)
}
