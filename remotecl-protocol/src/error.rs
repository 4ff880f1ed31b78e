//! Protocol error types.

use crate::tag::PacketTag;
use thiserror::Error;

/// Unrecoverable stream-level failures. Any of these terminates the
/// affected stream; none of them can be reported to the peer in-band.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection terminated by peer")]
    Terminated,

    #[error("unknown packet tag {0:#04x}")]
    UnknownTag(u8),

    #[error("unexpected packet: expected {expected:?}, got {actual:?}")]
    UnexpectedPacket {
        expected: PacketTag,
        actual: PacketTag,
    },

    #[error("incompatible protocol version")]
    VersionMismatch,

    #[error("sequence length {len} exceeds prefix maximum {max}")]
    SequenceTooLong { len: usize, max: u64 },

    #[error("allocation of {bytes} bytes failed")]
    Allocation { bytes: usize },

    #[error("compressed payload did not inflate to the declared size")]
    Decompress,
}

impl TransportError {
    /// Whether this error represents handle-space or memory exhaustion
    /// rather than a broken stream. Exhaustion is reported to the peer as
    /// an in-band error; everything else tears the connection down.
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self, TransportError::Allocation { .. })
    }
}

/// Errors surfaced by a packet read.
///
/// A server's in-band `Error` packet becomes [`ProtocolError::Remote`]; the
/// caller maps the carried status code back to the host API's return code.
/// Everything else is a [`TransportError`] and ends the stream.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("remote error {0}")]
    Remote(i32),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        ProtocolError::Transport(TransportError::Io(err))
    }
}

impl ProtocolError {
    /// The status code to hand back at the host-API boundary.
    pub fn status_code(&self) -> i32 {
        match self {
            ProtocolError::Remote(code) => *code,
            ProtocolError::Transport(e) if e.is_resource_exhaustion() => {
                crate::status::OUT_OF_HOST_MEMORY
            }
            ProtocolError::Transport(_) => crate::status::DEVICE_NOT_AVAILABLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status;

    #[test]
    fn remote_error_keeps_code() {
        let err = ProtocolError::Remote(-31);
        assert_eq!(err.status_code(), -31);
    }

    #[test]
    fn transport_error_maps_to_device_not_available() {
        let err = ProtocolError::Transport(TransportError::Terminated);
        assert_eq!(err.status_code(), status::DEVICE_NOT_AVAILABLE);
    }

    #[test]
    fn allocation_failure_maps_to_out_of_host_memory() {
        let err = ProtocolError::Transport(TransportError::Allocation { bytes: 1 << 40 });
        assert_eq!(err.status_code(), status::OUT_OF_HOST_MEMORY);
    }
}
