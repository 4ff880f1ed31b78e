//! Buffer calls, including client-side mappings.

use super::{read_info_reply, InfoReply};
use crate::connection::Connection;
use crate::error::ClientError;
use crate::mapping::{Mapping, MAP_READ, MAP_WRITE};
use remotecl_protocol::packets::memory::{
    CreateBuffer, CreateSubBuffer, FillBuffer, GetMemObjInfo, ReadBuffer, ReadBufferRect,
    WriteBuffer, MAX_FILL_PATTERN,
};
use remotecl_protocol::packets::refcount::ObjectKind;
use remotecl_protocol::packets::{IdListPacket, IdPacket, SuccessPacket};
use remotecl_protocol::payload::Payload;
use remotecl_protocol::{status, ObjectId};

/// Memory-object parameter naming the owning context.
pub const MEM_CONTEXT: u32 = 0x1106;
/// Memory-object parameter naming the parent of a sub-buffer.
pub const MEM_ASSOCIATED_MEMOBJECT: u32 = 0x1107;

impl Connection {
    /// Creates a buffer, optionally seeding it with host data.
    pub async fn create_buffer(
        &self,
        context: ObjectId,
        flags: u32,
        size: u32,
        host_data: Option<&[u8]>,
    ) -> Result<ObjectId, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&CreateBuffer {
                flags,
                size,
                context,
                expect_payload: host_data.is_some(),
            })
            .await?;
        if let Some(data) = host_data {
            state.stream.send(&Payload::<u32>::new(data.to_vec())).await?;
        }
        state.stream.flush().await?;
        let id: IdPacket = state.stream.recv().await?;
        state.registry.register(id.0, ObjectKind::Memory);
        Ok(id.0)
    }

    pub async fn create_sub_buffer(
        &self,
        buffer: ObjectId,
        flags: u32,
        create_type: u32,
        offset: u32,
        size: u32,
    ) -> Result<ObjectId, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&CreateSubBuffer {
                flags,
                size,
                offset,
                create_type,
                buffer,
            })
            .await?;
        state.stream.flush().await?;
        let id: IdPacket = state.stream.recv().await?;
        state.registry.register(id.0, ObjectKind::Memory);
        Ok(id.0)
    }

    /// Reads a buffer region. The transfer blocks until the data payload
    /// arrives; background reads are not supported over the wire. Returns
    /// the data and the completion event when one was requested.
    pub async fn read_buffer(
        &self,
        queue: ObjectId,
        buffer: ObjectId,
        offset: u32,
        size: u32,
        wait_events: &[ObjectId],
        want_event: bool,
    ) -> Result<(Vec<u8>, Option<ObjectId>), ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&ReadBuffer {
                buffer,
                queue,
                size,
                offset,
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

    /// Reads a rectangular buffer region laid out with the host pitches.
    #[allow(clippy::too_many_arguments)]
    pub async fn read_buffer_rect(
        &self,
        queue: ObjectId,
        buffer: ObjectId,
        buffer_origin: [u32; 3],
        host_origin: [u32; 3],
        region: [u32; 3],
        pitches: [u32; 4],
        wait_events: &[ObjectId],
        want_event: bool,
    ) -> Result<(Vec<u8>, Option<ObjectId>), ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&ReadBufferRect {
                buffer,
                queue,
                buffer_origin,
                host_origin,
                region,
                buffer_row_pitch: pitches[0],
                buffer_slice_pitch: pitches[1],
                host_row_pitch: pitches[2],
                host_slice_pitch: pitches[3],
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

    /// Writes a buffer region. Returns the completion event when one was
    /// requested.
    #[allow(clippy::too_many_arguments)]
    pub async fn write_buffer(
        &self,
        queue: ObjectId,
        buffer: ObjectId,
        offset: u32,
        data: &[u8],
        block: bool,
        wait_events: &[ObjectId],
        want_event: bool,
    ) -> Result<Option<ObjectId>, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&WriteBuffer {
                buffer,
                queue,
                size: data.len() as u32,
                offset,
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
        state.stream.send(&Payload::<u32>::new(data.to_vec())).await?;
        state.stream.flush().await?;

        let event = if want_event {
            let id: IdPacket = state.stream.recv().await?;
            state.registry.register(id.0, ObjectKind::Event);
            Some(id.0)
        } else {
            None
        };
        state.stream.recv::<SuccessPacket>().await?;
        Ok(event)
    }

    /// Fills a buffer region with a repeated pattern.
    #[allow(clippy::too_many_arguments)]
    pub async fn fill_buffer(
        &self,
        queue: ObjectId,
        buffer: ObjectId,
        pattern: &[u8],
        offset: u32,
        size: u32,
        wait_events: &[ObjectId],
        want_event: bool,
    ) -> Result<Option<ObjectId>, ClientError> {
        if pattern.is_empty() || pattern.len() > MAX_FILL_PATTERN {
            return Err(ClientError::InvalidArgument(status::INVALID_VALUE));
        }
        let mut padded = [0u8; MAX_FILL_PATTERN];
        padded[..pattern.len()].copy_from_slice(pattern);

        let mut state = self.lock().await;
        state
            .stream
            .send(&FillBuffer {
                buffer,
                queue,
                size,
                offset,
                pattern_size: pattern.len() as u8,
                want_event,
                expect_event_list: !wait_events.is_empty(),
                pattern: padded,
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
        state.stream.recv::<SuccessPacket>().await?;
        Ok(event)
    }

    pub async fn mem_obj_info(
        &self,
        mem: ObjectId,
        param: u32,
    ) -> Result<InfoReply, ClientError> {
        let mut state = self.lock().await;
        state.stream.send(&GetMemObjInfo { param, id: mem }).await?;
        state.stream.flush().await?;
        let reply = read_info_reply(&mut state.stream).await?;
        if let InfoReply::Id(id) = reply {
            match param {
                MEM_CONTEXT => {
                    state.registry.get_or_insert(id, ObjectKind::Context);
                }
                MEM_ASSOCIATED_MEMOBJECT => {
                    state.registry.get_or_insert(id, ObjectKind::Memory);
                }
                _ => {}
            }
        }
        Ok(reply)
    }

    /// Maps a buffer region into a client-side staging buffer and returns
    /// the mapping token. Read-intent mappings are populated from the
    /// remote buffer first; zero-length regions are accepted.
    pub async fn map_buffer(
        &self,
        queue: ObjectId,
        buffer: ObjectId,
        flags: u64,
        offset: u32,
        size: u32,
    ) -> Result<usize, ClientError> {
        let data = if flags & MAP_READ != 0 && size > 0 {
            self.read_buffer(queue, buffer, offset, size, &[], false)
                .await?
                .0
        } else {
            vec![0u8; size as usize]
        };

        let state = self.lock().await;
        let proxy = state
            .registry
            .get(buffer, ObjectKind::Memory)
            .ok_or(ClientError::InvalidArgument(status::INVALID_MEM_OBJECT))?;
        Ok(proxy.add_mapping(Mapping::new(data, offset as usize, flags)))
    }

    /// Flushes a write-intent mapping back to the remote buffer and drops
    /// the mapping.
    pub async fn unmap_buffer(
        &self,
        queue: ObjectId,
        buffer: ObjectId,
        token: usize,
    ) -> Result<(), ClientError> {
        let mapping = {
            let state = self.lock().await;
            let proxy = state
                .registry
                .get(buffer, ObjectKind::Memory)
                .ok_or(ClientError::InvalidArgument(status::INVALID_MEM_OBJECT))?;
            proxy
                .take_mapping(token)
                .ok_or(ClientError::InvalidArgument(status::INVALID_VALUE))?
        };

        if mapping.flags & MAP_WRITE != 0 && mapping.size() > 0 {
            self.write_buffer(
                queue,
                buffer,
                mapping.offset as u32,
                mapping.data(),
                true,
                &[],
                false,
            )
            .await?;
        }
        Ok(())
    }

    /// Copies into a mapping's staging buffer, for callers that work with
    /// tokens rather than raw pointers.
    pub async fn write_mapping(
        &self,
        buffer: ObjectId,
        token: usize,
        bytes: &[u8],
    ) -> Result<(), ClientError> {
        let state = self.lock().await;
        let proxy = state
            .registry
            .get(buffer, ObjectKind::Memory)
            .ok_or(ClientError::InvalidArgument(status::INVALID_MEM_OBJECT))?;
        let mut mapping = proxy
            .take_mapping(token)
            .ok_or(ClientError::InvalidArgument(status::INVALID_VALUE))?;
        let len = bytes.len().min(mapping.size());
        mapping.data_mut()[..len].copy_from_slice(&bytes[..len]);
        proxy.add_mapping(mapping);
        Ok(())
    }
}
