//! Image calls.

use super::{read_info_reply, InfoReply};
use crate::connection::Connection;
use crate::error::ClientError;
use remotecl_protocol::packets::image::{CreateImage, GetImageInfo, ReadImage, WriteImage};
use remotecl_protocol::packets::refcount::ObjectKind;
use remotecl_protocol::packets::{IdListPacket, IdPacket, SuccessPacket};
use remotecl_protocol::payload::{Payload, PayloadValue};
use remotecl_protocol::{status, ObjectId};

/// Image parameter naming the backing buffer.
pub const IMAGE_BUFFER: u32 = 0x1118;

/// Memory flag requesting a copy of host memory at creation; mirrored by
/// the server, which answers with the byte count it needs.
pub const MEM_COPY_HOST_PTR: u32 = 1 << 5;

impl Connection {
    /// Creates an image. When `flags` request a host copy, `pixels` must
    /// supply at least the byte count the server derives from the image
    /// shape.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_image(
        &self,
        context: ObjectId,
        flags: u32,
        channel_order: u32,
        channel_type: u32,
        image_type: u32,
        shape: [u32; 3],
        pixels: Option<&[u8]>,
    ) -> Result<ObjectId, ClientError> {
        let copy_host = flags & MEM_COPY_HOST_PTR != 0;
        if copy_host && pixels.is_none() {
            return Err(ClientError::InvalidArgument(status::INVALID_VALUE));
        }

        let mut state = self.lock().await;
        state
            .stream
            .send(&CreateImage {
                flags,
                channel_order,
                channel_type,
                image_type,
                width: shape[0],
                height: shape[1],
                depth: shape[2],
                array_size: 0,
                row_pitch: 0,
                slice_pitch: 0,
                mip_levels: 0,
                samples: 0,
                context,
            })
            .await?;
        state.stream.flush().await?;

        if copy_host {
            // The server reports how many bytes the pixel payload must
            // carry; short input is zero-padded to keep the exchange
            // well-formed.
            let wanted: PayloadValue<u32> = state.stream.recv().await?;
            let mut data = pixels.unwrap_or(&[]).to_vec();
            data.resize(wanted.0 as usize, 0);
            state.stream.send(&Payload::<u32>::new(data)).await?;
            state.stream.flush().await?;
        }

        let id: IdPacket = state.stream.recv().await?;
        state.registry.register(id.0, ObjectKind::Memory);
        Ok(id.0)
    }

    /// Reads an image region; the server resolves the pixel size and
    /// sizes the reply.
    #[allow(clippy::too_many_arguments)]
    pub async fn read_image(
        &self,
        queue: ObjectId,
        image: ObjectId,
        origin: [u32; 3],
        region: [u32; 3],
        row_pitch: u32,
        slice_pitch: u32,
        wait_events: &[ObjectId],
        want_event: bool,
    ) -> Result<(Vec<u8>, Option<ObjectId>), ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&ReadImage {
                image,
                queue,
                origin,
                region,
                row_pitch,
                slice_pitch,
                want_event,
                expect_event_list: !wait_events.is_empty(),
                block: true,
            })
            .await?;
        if !wait_events.is_empty() {
            state
                .stream
                .send(&IdListPacket {
                    ids: wait_events.to_vec(),
                })
                .await?;
        }
        state.stream.flush().await?;

        let event = if want_event {
            let id: IdPacket = state.stream.recv().await?;
            state.registry.register(id.0, ObjectKind::Event);
            Some(id.0)
        } else {
            None
        };
        let data: Payload = state.stream.recv().await?;
        Ok((data.into_data(), event))
    }

    /// Writes an image region. The server answers with the byte count it
    /// needs before the pixels travel.
    #[allow(clippy::too_many_arguments)]
    pub async fn write_image(
        &self,
        queue: ObjectId,
        image: ObjectId,
        origin: [u32; 3],
        region: [u32; 3],
        row_pitch: u32,
        slice_pitch: u32,
        pixels: &[u8],
        wait_events: &[ObjectId],
        block: bool,
        want_event: bool,
    ) -> Result<Option<ObjectId>, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&WriteImage {
                image,
                queue,
                origin,
                region,
                row_pitch,
                slice_pitch,
                want_event,
                expect_event_list: !wait_events.is_empty(),
                block,
            })
            .await?;
        if !wait_events.is_empty() {
            state
                .stream
                .send(&IdListPacket {
                    ids: wait_events.to_vec(),
                })
                .await?;
        }
        state.stream.flush().await?;

        let wanted: PayloadValue<u32> = state.stream.recv().await?;
        let mut data = pixels.to_vec();
        data.resize(wanted.0 as usize, 0);
        state.stream.send(&Payload::<u32>::new(data)).await?;
        state.stream.flush().await?;

        if want_event {
            let id: IdPacket = state.stream.recv().await?;
            state.registry.register(id.0, ObjectKind::Event);
            Ok(Some(id.0))
        } else {
            state.stream.recv::<SuccessPacket>().await?;
            Ok(None)
        }
    }

    pub async fn image_info(&self, image: ObjectId, param: u32) -> Result<InfoReply, ClientError> {
        let mut state = self.lock().await;
        state.stream.send(&GetImageInfo { param, id: image }).await?;
        state.stream.flush().await?;
        let reply = read_info_reply(&mut state.stream).await?;
        if let InfoReply::Id(id) = reply {
            if param == IMAGE_BUFFER {
                state.registry.get_or_insert(id, ObjectKind::Memory);
            }
        }
        Ok(reply)
    }
}
