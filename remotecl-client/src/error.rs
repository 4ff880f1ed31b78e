//! Client error types.

use remotecl_protocol::{status, ProtocolError, TransportError};
use thiserror::Error;

/// Client errors.
///
/// Surface bindings translate any of these into a host-API return code via
/// [`status_code`](ClientError::status_code): remote errors keep their
/// carried code, transport failures become device-not-available, and
/// resource exhaustion becomes out-of-host-memory.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("not connected")]
    NotConnected,

    #[error("invalid argument (status {0})")]
    InvalidArgument(i32),
}

impl ClientError {
    /// The host-API return code for this failure.
    pub fn status_code(&self) -> i32 {
        match self {
            ClientError::Protocol(err) => err.status_code(),
            ClientError::Transport(err) if err.is_resource_exhaustion() => {
                status::OUT_OF_HOST_MEMORY
            }
            ClientError::Io(_) | ClientError::Transport(_) | ClientError::NotConnected => {
                status::DEVICE_NOT_AVAILABLE
            }
            ClientError::InvalidArgument(code) => *code,
        }
    }

    /// Whether the failure came from the server as an in-band error.
    pub fn is_remote(&self) -> bool {
        matches!(self, ClientError::Protocol(ProtocolError::Remote(_)))
    }
}
