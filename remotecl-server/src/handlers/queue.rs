//! Command-queue handlers.

use crate::error::ServerError;
use crate::instance::ServerInstance;
use crate::native::NativeBackend;
use remotecl_protocol::packets::queue::{
    CreateQueue, CreateQueueWithProp, FinishQueue, FlushQueue, GetQueueInfo,
};
use remotecl_protocol::packets::{IdPacket, SuccessPacket};

impl<B: NativeBackend> ServerInstance<B> {
    pub(crate) async fn create_queue(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<CreateQueue>().await?;
        let context = self.handles.get(packet.context);
        let device = self.handles.get(packet.device);

        match self.backend.create_queue(context, device, packet.properties) {
            Ok(queue) => {
                let id = self.handles.id_for(queue)?;
                self.stream.send(&IdPacket(id)).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn create_queue_with_properties(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<CreateQueueWithProp>().await?;
        let context = self.handles.get(packet.context);
        let device = self.handles.get(packet.device);

        match self
            .backend
            .create_queue_with_properties(context, device, &packet.properties)
        {
            Ok(queue) => {
                let id = self.handles.id_for(queue)?;
                self.stream.send(&IdPacket(id)).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn get_queue_info(&mut self) -> Result<(), ServerError> {
        let query = self.stream.recv::<GetQueueInfo>().await?;
        let queue = self.handles.get(query.id);

        match self.backend.queue_info(queue, query.param) {
            Ok(info) => self.reply_info(info).await,
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn flush_queue(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<FlushQueue>().await?;
        let queue = self.handles.get(packet.0);
        match self.backend.flush(queue) {
            Ok(()) => {
                self.stream.send(&SuccessPacket).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn finish_queue(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<FinishQueue>().await?;
        let queue = self.handles.get(packet.0);
        // Finish blocks for as long as the device needs; the client holds
        // its connection lock for the whole wait by design.
        match self.backend.finish(queue) {
            Ok(()) => {
                self.stream.send(&SuccessPacket).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }
}
