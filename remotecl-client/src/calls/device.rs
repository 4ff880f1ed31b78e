//! Device calls.

use super::{read_info_reply, InfoReply};
use crate::connection::Connection;
use crate::error::ClientError;
use remotecl_protocol::packets::device::{GetDeviceIds, GetDeviceInfo};
use remotecl_protocol::packets::refcount::ObjectKind;
use remotecl_protocol::packets::IdListPacket;
use remotecl_protocol::ObjectId;

/// Device parameter naming the owning platform.
pub const DEVICE_PLATFORM: u32 = 0x1031;

impl Connection {
    /// Enumerates devices of a platform, registering a proxy for each.
    pub async fn device_ids(
        &self,
        platform: ObjectId,
        device_type: u64,
    ) -> Result<Vec<ObjectId>, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&GetDeviceIds {
                device_type,
                platform_id: platform,
            })
            .await?;
        state.stream.flush().await?;
        let list: IdListPacket = state.stream.recv().await?;
        for &id in &list.ids {
            state.registry.get_or_insert(id, ObjectKind::Device);
        }
        Ok(list.ids)
    }

    pub async fn device_info(
        &self,
        device: ObjectId,
        param: u32,
    ) -> Result<InfoReply, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&GetDeviceInfo { param, id: device })
            .await?;
        state.stream.flush().await?;
        let reply = read_info_reply(&mut state.stream).await?;
        if let InfoReply::Id(id) = reply {
            if param == DEVICE_PLATFORM {
                state.registry.get_or_insert(id, ObjectKind::Platform);
            }
        }
        Ok(reply)
    }
}
