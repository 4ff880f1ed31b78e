//! Reference-count calls.

use crate::connection::Connection;
use crate::error::ClientError;
use remotecl_protocol::packets::refcount::{ObjectKind, ReleasePacket, RetainPacket};
use remotecl_protocol::packets::SuccessPacket;
use remotecl_protocol::{status, ObjectId};

impl Connection {
    pub async fn retain(&self, kind: ObjectKind, id: ObjectId) -> Result<(), ClientError> {
        if kind == ObjectKind::Platform {
            return Err(ClientError::InvalidArgument(status::INVALID_VALUE));
        }
        let mut state = self.lock().await;
        state.stream.send(&RetainPacket { kind, id }).await?;
        state.stream.flush().await?;
        state.stream.recv::<SuccessPacket>().await?;
        Ok(())
    }

    /// Releases the remote reference. The local proxy stays alive until
    /// connection teardown; IDs are never reused.
    pub async fn release(&self, kind: ObjectKind, id: ObjectId) -> Result<(), ClientError> {
        if kind == ObjectKind::Platform {
            return Err(ClientError::InvalidArgument(status::INVALID_VALUE));
        }
        let mut state = self.lock().await;
        state.stream.send(&ReleasePacket { kind, id }).await?;
        state.stream.flush().await?;
        state.stream.recv::<SuccessPacket>().await?;
        Ok(())
    }
}
