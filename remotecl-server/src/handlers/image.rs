//! Image handlers.
//!
//! The client cannot size pixel transfers itself: the element size lives
//! with the native implementation. Write paths therefore start with a
//! byte-count round trip; read paths allocate server-side.

use crate::error::ServerError;
use crate::instance::ServerInstance;
use crate::native::{constants, ImageDesc, ImageFormat, NativeBackend};
use remotecl_protocol::packets::image::{CreateImage, GetImageInfo, ReadImage, WriteImage};
use remotecl_protocol::packets::refcount::ObjectKind;
use remotecl_protocol::packets::{IdPacket, SuccessPacket};
use remotecl_protocol::payload::{Payload, PayloadValue};

fn desc_of(packet: &CreateImage) -> ImageDesc {
    ImageDesc {
        image_type: packet.image_type,
        width: packet.width,
        height: packet.height,
        depth: packet.depth,
        array_size: packet.array_size,
        row_pitch: packet.row_pitch,
        slice_pitch: packet.slice_pitch,
        mip_levels: packet.mip_levels,
        samples: packet.samples,
    }
}

impl<B: NativeBackend> ServerInstance<B> {
    pub(crate) async fn create_image(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<CreateImage>().await?;
        let context = self.handles.get(packet.context);
        let format = ImageFormat {
            channel_order: packet.channel_order,
            channel_type: packet.channel_type,
        };
        let desc = desc_of(&packet);

        let expect_payload = packet.flags & constants::MEM_COPY_HOST_PTR != 0;
        // The host-pointer copy is remoted manually.
        let flags = packet.flags & !constants::MEM_COPY_HOST_PTR;

        let image = match self.backend.create_image(context, flags, format, desc, None) {
            Ok(image) => image,
            Err(code) => return self.reply_error(code).await,
        };

        if !expect_payload {
            let id = self.handles.id_for(image)?;
            self.stream.send(&IdPacket(id)).await?;
            return Ok(());
        }

        // Tell the client how many bytes the pixel payload must carry,
        // then recreate the image around the received data.
        let element_size = match self.backend.image_element_size(image) {
            Ok(size) => size,
            Err(code) => return self.reply_error(code).await,
        };
        let w = packet.width.max(1) as usize;
        let h = packet.height.max(1) as usize;
        let d = packet.depth.max(1) as usize;
        let data_size = (element_size * w * h * d) as u32;

        self.stream.send(&PayloadValue(data_size)).await?;
        self.stream.flush().await?;
        let pixels: Payload = self.stream.recv().await?;

        let _ = self.backend.release(ObjectKind::Memory, image);
        match self.backend.create_image(
            context,
            packet.flags,
            format,
            desc,
            Some(&pixels.data),
        ) {
            Ok(image) => {
                let id = self.handles.id_for(image)?;
                self.stream.send(&IdPacket(id)).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn read_image(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<ReadImage>().await?;
        // Drain the whole request before any native call can fail, or an
        // early error reply would leave the wait list in the stream.
        let wait_list = self.read_wait_list(packet.expect_event_list).await?;

        let image = self.handles.get(packet.image);
        let element_size = match self.backend.image_element_size(image) {
            Ok(size) => size,
            Err(code) => return self.reply_error(code).await,
        };

        let queue = self.handles.get(packet.queue);

        let to_usize = |a: [u32; 3]| [a[0] as usize, a[1] as usize, a[2] as usize];
        let region = to_usize(packet.region);
        let out_size = element_size * region[0].max(1) * region[1].max(1) * region[2].max(1);

        let result = self.backend.enqueue_read_image(
            queue,
            image,
            packet.block,
            to_usize(packet.origin),
            region,
            packet.row_pitch as usize,
            packet.slice_pitch as usize,
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

    pub(crate) async fn write_image(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<WriteImage>().await?;
        let wait_list = self.read_wait_list(packet.expect_event_list).await?;

        let image = self.handles.get(packet.image);
        let element_size = match self.backend.image_element_size(image) {
            Ok(size) => size,
            Err(code) => return self.reply_error(code).await,
        };

        let queue = self.handles.get(packet.queue);

        let to_usize = |a: [u32; 3]| [a[0] as usize, a[1] as usize, a[2] as usize];
        let region = to_usize(packet.region);
        let data_size =
            (element_size * region[0].max(1) * region[1].max(1) * region[2].max(1)) as u32;

        // Report the required byte count, then receive the pixels.
        self.stream.send(&PayloadValue(data_size)).await?;
        self.stream.flush().await?;
        let pixels: Payload = self.stream.recv().await?;

        let result = self.backend.enqueue_write_image(
            queue,
            image,
            packet.block,
            to_usize(packet.origin),
            region,
            packet.row_pitch as usize,
            packet.slice_pitch as usize,
            &pixels.data,
            &wait_list,
            packet.want_event,
        );

        match result {
            Ok(Some(event)) => {
                self.reply_event(Some(event)).await?;
                Ok(())
            }
            Ok(None) => {
                self.stream.send(&SuccessPacket).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn get_image_info(&mut self) -> Result<(), ServerError> {
        let query = self.stream.recv::<GetImageInfo>().await?;
        let image = self.handles.get(query.id);

        match self.backend.image_info(image, query.param) {
            Ok(info) => self.reply_info(info).await,
            Err(code) => self.reply_error(code).await,
        }
    }
}
