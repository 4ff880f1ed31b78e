//! Server error types.

use remotecl_protocol::{status, ProtocolError, TransportError};
use thiserror::Error;

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("connection ID space exhausted")]
    HandleSpaceExhausted,
}

impl ServerError {
    /// If the error is recoverable resource exhaustion, the status code to
    /// report in-band. Anything else terminates the connection.
    pub fn exhaustion_status(&self) -> Option<i32> {
        match self {
            ServerError::HandleSpaceExhausted => Some(status::OUT_OF_RESOURCES),
            ServerError::Transport(t) if t.is_resource_exhaustion() => {
                Some(status::OUT_OF_HOST_MEMORY)
            }
            ServerError::Protocol(ProtocolError::Transport(t)) if t.is_resource_exhaustion() => {
                Some(status::OUT_OF_HOST_MEMORY)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_exhaustion_is_recoverable() {
        assert_eq!(
            ServerError::HandleSpaceExhausted.exhaustion_status(),
            Some(status::OUT_OF_RESOURCES)
        );
    }

    #[test]
    fn allocation_failure_is_recoverable() {
        let err = ServerError::Transport(TransportError::Allocation { bytes: 1 << 48 });
        assert_eq!(err.exhaustion_status(), Some(status::OUT_OF_HOST_MEMORY));
    }

    #[test]
    fn broken_stream_is_fatal() {
        let err = ServerError::Transport(TransportError::Terminated);
        assert_eq!(err.exhaustion_status(), None);
    }
}
