//! Command-queue calls.

use super::{read_info_reply, InfoReply};
use crate::connection::Connection;
use crate::error::ClientError;
use remotecl_protocol::packets::queue::{
    CreateQueue, CreateQueueWithProp, FinishQueue, FlushQueue, GetQueueInfo,
};
use remotecl_protocol::packets::refcount::ObjectKind;
use remotecl_protocol::packets::{IdPacket, SuccessPacket};
use remotecl_protocol::ObjectId;

/// Queue parameter naming the owning context.
pub const QUEUE_CONTEXT: u32 = 0x1090;
/// Queue parameter naming the target device.
pub const QUEUE_DEVICE: u32 = 0x1091;

impl Connection {
    pub async fn create_queue(
        &self,
        context: ObjectId,
        device: ObjectId,
        properties: u32,
    ) -> Result<ObjectId, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&CreateQueue {
                context,
                device,
                properties,
            })
            .await?;
        state.stream.flush().await?;
        let id: IdPacket = state.stream.recv().await?;
        state.registry.register(id.0, ObjectKind::Queue);
        Ok(id.0)
    }

    pub async fn create_queue_with_properties(
        &self,
        context: ObjectId,
        device: ObjectId,
        properties: Vec<u64>,
    ) -> Result<ObjectId, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&CreateQueueWithProp {
                context,
                device,
                properties,
            })
            .await?;
        state.stream.flush().await?;
        let id: IdPacket = state.stream.recv().await?;
        state.registry.register(id.0, ObjectKind::Queue);
        Ok(id.0)
    }

    pub async fn queue_info(&self, queue: ObjectId, param: u32) -> Result<InfoReply, ClientError> {
        let mut state = self.lock().await;
        state.stream.send(&GetQueueInfo { param, id: queue }).await?;
        state.stream.flush().await?;
        let reply = read_info_reply(&mut state.stream).await?;
        if let InfoReply::Id(id) = reply {
            match param {
                QUEUE_CONTEXT => {
                    state.registry.get_or_insert(id, ObjectKind::Context);
                }
                QUEUE_DEVICE => {
                    state.registry.get_or_insert(id, ObjectKind::Device);
                }
                _ => {}
            }
        }
        Ok(reply)
    }

    pub async fn flush(&self, queue: ObjectId) -> Result<(), ClientError> {
        let mut state = self.lock().await;
        state.stream.send(&FlushQueue(queue)).await?;
        state.stream.flush().await?;
        state.stream.recv::<SuccessPacket>().await?;
        Ok(())
    }

    /// Blocks until the queue drains. The connection lock is held for the
    /// whole wait; calls are serialized per connection by design.
    pub async fn finish(&self, queue: ObjectId) -> Result<(), ClientError> {
        let mut state = self.lock().await;
        state.stream.send(&FinishQueue(queue)).await?;
        state.stream.flush().await?;
        state.stream.recv::<SuccessPacket>().await?;
        Ok(())
    }
}
