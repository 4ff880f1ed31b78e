//! Buffer handlers.

use crate::error::ServerError;
use crate::instance::ServerInstance;
use crate::native::{NativeBackend, RectTransfer};
use remotecl_protocol::packets::memory::{
    CreateBuffer, CreateSubBuffer, FillBuffer, GetMemObjInfo, ReadBuffer, ReadBufferRect,
    WriteBuffer,
};
use remotecl_protocol::packets::{IdPacket, SuccessPacket};
use remotecl_protocol::payload::Payload;

/// Byte size of the host-side destination of a rectangular read, derived
/// from the host origin, pitches and region.
fn rect_host_size(rect: &RectTransfer) -> usize {
    let row_pitch = if rect.host_row_pitch == 0 {
        rect.region[0]
    } else {
        rect.host_row_pitch
    };
    let slice_pitch = if rect.host_slice_pitch == 0 {
        row_pitch * rect.region[1]
    } else {
        rect.host_slice_pitch
    };
    let origin = rect.host_origin[0] + rect.host_origin[1] * row_pitch + rect.host_origin[2] * slice_pitch;
    origin
        + rect.region[0]
        + row_pitch * (rect.region[1].saturating_sub(1))
        + slice_pitch * (rect.region[2].saturating_sub(1))
}

impl<B: NativeBackend> ServerInstance<B> {
    pub(crate) async fn create_buffer(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<CreateBuffer>().await?;
        let context = self.handles.get(packet.context);

        let host_data = if packet.expect_payload {
            let payload: Payload = self.stream.recv().await?;
            Some(payload.into_data())
        } else {
            None
        };

        match self.backend.create_buffer(
            context,
            packet.flags,
            packet.size as usize,
            host_data.as_deref(),
        ) {
            Ok(buffer) => {
                let id = self.handles.id_for(buffer)?;
                self.stream.send(&IdPacket(id)).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn create_sub_buffer(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<CreateSubBuffer>().await?;
        let buffer = self.handles.get(packet.buffer);

        match self.backend.create_sub_buffer(
            buffer,
            packet.flags,
            packet.create_type,
            packet.offset as usize,
            packet.size as usize,
        ) {
            Ok(sub) => {
                let id = self.handles.id_for(sub)?;
                self.stream.send(&IdPacket(id)).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn read_buffer(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<ReadBuffer>().await?;
        let wait_list = self.read_wait_list(packet.expect_event_list).await?;

        let buffer = self.handles.get(packet.buffer);
        let queue = self.handles.get(packet.queue);

        // Background reads are not supported over the wire; the native
        // read always blocks before the payload is sent back.
        let result = self.backend.enqueue_read_buffer(
            queue,
            buffer,
            packet.offset as usize,
            packet.size as usize,
            &wait_list,
            packet.want_event,
        );

        match result {
            Ok((data, event)) => {
                self.reply_event(event).await?;
                self.stream.send(&Payload::<u32>::new(data)).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn read_buffer_rect(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<ReadBufferRect>().await?;
        let wait_list = self.read_wait_list(packet.expect_event_list).await?;

        let buffer = self.handles.get(packet.buffer);
        let queue = self.handles.get(packet.queue);

        let to_usize = |a: [u32; 3]| [a[0] as usize, a[1] as usize, a[2] as usize];
        let rect = RectTransfer {
            buffer_origin: to_usize(packet.buffer_origin),
            host_origin: to_usize(packet.host_origin),
            region: to_usize(packet.region),
            buffer_row_pitch: packet.buffer_row_pitch as usize,
            buffer_slice_pitch: packet.buffer_slice_pitch as usize,
            host_row_pitch: packet.host_row_pitch as usize,
            host_slice_pitch: packet.host_slice_pitch as usize,
        };
        let out_size = rect_host_size(&rect);

        let result = self.backend.enqueue_read_buffer_rect(
            queue,
            buffer,
            &rect,
            out_size,
            &wait_list,
            packet.want_event,
        );

        match result {
            Ok((data, event)) => {
                self.reply_event(event).await?;
                self.stream.send(&Payload::<u32>::new(data)).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn write_buffer(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<WriteBuffer>().await?;
        let wait_list = self.read_wait_list(packet.expect_event_list).await?;
        let data: Payload = self.stream.recv().await?;

        let buffer = self.handles.get(packet.buffer);
        let queue = self.handles.get(packet.queue);

        let result = self.backend.enqueue_write_buffer(
            queue,
            buffer,
            packet.block,
            packet.offset as usize,
            &data.data,
            &wait_list,
            packet.want_event,
        );

        match result {
            Ok(event) => {
                self.reply_event(event).await?;
                self.stream.send(&SuccessPacket).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn fill_buffer(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<FillBuffer>().await?;
        let wait_list = self.read_wait_list(packet.expect_event_list).await?;

        let buffer = self.handles.get(packet.buffer);
        let queue = self.handles.get(packet.queue);
        let pattern = &packet.pattern[..usize::from(packet.pattern_size)];

        let result = self.backend.enqueue_fill_buffer(
            queue,
            buffer,
            pattern,
            packet.offset as usize,
            packet.size as usize,
            &wait_list,
            packet.want_event,
        );

        match result {
            Ok(event) => {
                self.reply_event(event).await?;
                self.stream.send(&SuccessPacket).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn get_mem_obj_info(&mut self) -> Result<(), ServerError> {
        let query = self.stream.recv::<GetMemObjInfo>().await?;
        let mem = self.handles.get(query.id);

        match self.backend.mem_obj_info(mem, query.param) {
            Ok(info) => self.reply_info(info).await,
            Err(code) => self.reply_error(code).await,
        }
    }
}
