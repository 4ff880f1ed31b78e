//! Event handlers and callback registration.

use crate::error::ServerError;
use crate::instance::{CallbackFire, ServerInstance};
use crate::native::NativeBackend;
use remotecl_protocol::packets::event::{
    CreateUserEvent, GetEventInfo, GetEventProfilingInfo, RegisterEventCallback,
    SetUserEventStatus, WaitEvents,
};
use remotecl_protocol::packets::{IdListPacket, IdPacket, SuccessPacket};
use remotecl_protocol::payload::PayloadValue;

impl<B: NativeBackend> ServerInstance<B> {
    pub(crate) async fn create_user_event(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<CreateUserEvent>().await?;
        let context = self.handles.get(packet.0);

        match self.backend.create_user_event(context) {
            Ok(event) => {
                let id = self.handles.id_for(event)?;
                self.stream.send(&IdPacket(id)).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn set_user_event_status(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<SetUserEventStatus>().await?;
        let event = self.handles.get(packet.id);

        match self
            .backend
            .set_user_event_status(event, packet.status as i32)
        {
            Ok(()) => {
                self.stream.send(&SuccessPacket).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn get_event_info(&mut self) -> Result<(), ServerError> {
        let query = self.stream.recv::<GetEventInfo>().await?;
        let event = self.handles.get(query.id);

        match self.backend.event_info(event, query.param) {
            Ok(info) => self.reply_info(info).await,
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn get_event_profiling_info(&mut self) -> Result<(), ServerError> {
        let query = self.stream.recv::<GetEventProfilingInfo>().await?;
        let event = self.handles.get(query.id);

        match self.backend.event_profiling_info(event, query.param) {
            Ok(value) => {
                self.stream.send(&PayloadValue(value)).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn wait_for_events(&mut self) -> Result<(), ServerError> {
        self.stream.recv::<WaitEvents>().await?;
        let list = self.stream.recv::<IdListPacket>().await?;
        let events: Vec<_> = list.ids.iter().map(|&id| self.handles.get(id)).collect();

        match self.backend.wait_for_events(&events) {
            Ok(()) => {
                self.stream.send(&SuccessPacket).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    /// Registers a native callback that forwards through the event stream.
    ///
    /// Registration is requested after the enqueue that produced the event
    /// has completed its own exchange, so a firing can never overtake the
    /// enqueue's response. The native callback runs on an arbitrary
    /// thread and only posts to the writer task's channel.
    pub(crate) async fn register_event_callback(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<RegisterEventCallback>().await?;
        let event = self.handles.get(packet.event);

        let tx = self.event_tx.clone();
        let slot = packet.callback_id;
        if tx.is_none() {
            // No event stream was negotiated: the callback registers
            // natively but the firing has nowhere to go. The client is
            // aware of this degradation.
            tracing::debug!(peer = %self.peer, slot, "callback registered without event stream");
        }

        let result = self.backend.set_event_callback(
            event,
            packet.callback_type as i32,
            Box::new(move |status| {
                if let Some(tx) = tx {
                    let _ = tx.send(CallbackFire { slot, status });
                }
            }),
        );

        match result {
            Ok(()) => {
                self.stream.send(&SuccessPacket).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }
}
