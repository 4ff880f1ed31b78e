//! Reference-count forwarding.

use crate::error::ServerError;
use crate::instance::ServerInstance;
use crate::native::NativeBackend;
use remotecl_protocol::packets::refcount::{ObjectKind, ReleasePacket, RetainPacket};
use remotecl_protocol::packets::SuccessPacket;
use remotecl_protocol::status;

impl<B: NativeBackend> ServerInstance<B> {
    pub(crate) async fn handle_retain(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<RetainPacket>().await?;
        if packet.kind == ObjectKind::Platform {
            return self.reply_error(status::INVALID_VALUE).await;
        }
        let handle = self.handles.get(packet.id);
        match self.backend.retain(packet.kind, handle) {
            Ok(()) => {
                self.stream.send(&SuccessPacket).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn handle_release(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<ReleasePacket>().await?;
        if packet.kind == ObjectKind::Platform {
            return self.reply_error(status::INVALID_VALUE).await;
        }
        // The handle-table entry stays in place; releases never renumber.
        let handle = self.handles.get(packet.id);
        match self.backend.release(packet.kind, handle) {
            Ok(()) => {
                self.stream.send(&SuccessPacket).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }
}
