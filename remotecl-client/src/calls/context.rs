//! Context calls.

use super::{read_info_reply, InfoReply};
use crate::connection::Connection;
use crate::error::ClientError;
use remotecl_protocol::packets::context::{
    CreateContext, CreateContextFromType, GetContextInfo, GetImageFormats,
};
use remotecl_protocol::packets::refcount::ObjectKind;
use remotecl_protocol::packets::IdPacket;
use remotecl_protocol::payload::Payload;
use remotecl_protocol::ObjectId;

/// Context parameter naming the attached devices.
pub const CONTEXT_DEVICES: u32 = 0x1081;

/// A supported image channel layout, as returned by
/// [`Connection::image_formats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageFormatInfo {
    pub channel_order: u32,
    pub channel_type: u32,
}

impl Connection {
    pub async fn create_context(
        &self,
        properties: Vec<u64>,
        devices: Vec<ObjectId>,
    ) -> Result<ObjectId, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&CreateContext {
                properties,
                devices,
            })
            .await?;
        state.stream.flush().await?;
        let id: IdPacket = state.stream.recv().await?;
        state.registry.register(id.0, ObjectKind::Context);
        Ok(id.0)
    }

    pub async fn create_context_from_type(
        &self,
        properties: Vec<u64>,
        device_type: u64,
    ) -> Result<ObjectId, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&CreateContextFromType {
                device_type,
                properties,
            })
            .await?;
        state.stream.flush().await?;
        let id: IdPacket = state.stream.recv().await?;
        state.registry.register(id.0, ObjectKind::Context);
        Ok(id.0)
    }

    pub async fn context_info(
        &self,
        context: ObjectId,
        param: u32,
    ) -> Result<InfoReply, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&GetContextInfo { param, id: context })
            .await?;
        state.stream.flush().await?;
        let reply = read_info_reply(&mut state.stream).await?;
        if let InfoReply::Ids(ref ids) = reply {
            if param == CONTEXT_DEVICES {
                for &id in ids {
                    state.registry.get_or_insert(id, ObjectKind::Device);
                }
            }
        }
        Ok(reply)
    }

    /// The image formats a context supports for this memory type.
    pub async fn image_formats(
        &self,
        context: ObjectId,
        flags: u32,
        image_type: u32,
    ) -> Result<Vec<ImageFormatInfo>, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&GetImageFormats {
                context_id: context,
                flags,
                image_type,
            })
            .await?;
        state.stream.flush().await?;
        let payload: Payload<u16> = state.stream.recv().await?;
        let bytes = payload.into_data();

        let mut formats = Vec::with_capacity(bytes.len() / 8);
        for pair in bytes.chunks_exact(8) {
            formats.push(ImageFormatInfo {
                channel_order: u32::from_le_bytes(pair[0..4].try_into().unwrap()),
                channel_type: u32::from_le_bytes(pair[4..8].try_into().unwrap()),
            });
        }
        Ok(formats)
    }
}
