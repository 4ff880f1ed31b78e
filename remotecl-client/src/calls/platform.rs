//! Platform calls.

use crate::connection::Connection;
use crate::error::ClientError;
use remotecl_protocol::packets::platform::{GetPlatformIds, GetPlatformInfo};
use remotecl_protocol::packets::refcount::ObjectKind;
use remotecl_protocol::packets::IdListPacket;
use remotecl_protocol::payload::Payload;
use remotecl_protocol::ObjectId;

impl Connection {
    /// Enumerates the server's platforms, registering a proxy for each.
    pub async fn platform_ids(&self) -> Result<Vec<ObjectId>, ClientError> {
        let mut state = self.lock().await;
        state.stream.send(&GetPlatformIds).await?;
        state.stream.flush().await?;
        let list: IdListPacket = state.stream.recv().await?;
        for &id in &list.ids {
            state.registry.get_or_insert(id, ObjectKind::Platform);
        }
        Ok(list.ids)
    }

    pub async fn platform_info(
        &self,
        platform: ObjectId,
        param: u32,
    ) -> Result<Vec<u8>, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&GetPlatformInfo {
                param,
                id: platform,
            })
            .await?;
        state.stream.flush().await?;
        let reply: Payload = state.stream.recv().await?;
        Ok(reply.into_data())
    }
}
