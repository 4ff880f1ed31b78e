//! Event calls and callback registration.

use super::{read_info_reply, InfoReply};
use crate::connection::Connection;
use crate::error::ClientError;
use crate::events::EventCallbackFn;
use remotecl_protocol::packets::event::{
    CreateUserEvent, GetEventInfo, GetEventProfilingInfo, RegisterEventCallback,
    SetUserEventStatus, WaitEvents,
};
use remotecl_protocol::packets::refcount::ObjectKind;
use remotecl_protocol::packets::{IdListPacket, IdPacket, SuccessPacket};
use remotecl_protocol::payload::PayloadValue;
use remotecl_protocol::ObjectId;

/// Event parameter naming the command queue.
pub const EVENT_COMMAND_QUEUE: u32 = 0x11D0;
/// Event parameter naming the owning context.
pub const EVENT_CONTEXT: u32 = 0x11D4;

impl Connection {
    pub async fn create_user_event(&self, context: ObjectId) -> Result<ObjectId, ClientError> {
        let mut state = self.lock().await;
        state.stream.send(&CreateUserEvent(context)).await?;
        state.stream.flush().await?;
        let id: IdPacket = state.stream.recv().await?;
        state.registry.register(id.0, ObjectKind::Event);
        Ok(id.0)
    }

    pub async fn set_user_event_status(
        &self,
        event: ObjectId,
        execution_status: i32,
    ) -> Result<(), ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&SetUserEventStatus {
                status: execution_status as u32,
                id: event,
            })
            .await?;
        state.stream.flush().await?;
        state.stream.recv::<SuccessPacket>().await?;
        Ok(())
    }

    pub async fn event_info(&self, event: ObjectId, param: u32) -> Result<InfoReply, ClientError> {
        let mut state = self.lock().await;
        state.stream.send(&GetEventInfo { param, id: event }).await?;
        state.stream.flush().await?;
        let reply = read_info_reply(&mut state.stream).await?;
        if let InfoReply::Id(id) = reply {
            match param {
                EVENT_CONTEXT => {
                    state.registry.get_or_insert(id, ObjectKind::Context);
                }
                EVENT_COMMAND_QUEUE => {
                    state.registry.get_or_insert(id, ObjectKind::Queue);
                }
                _ => {}
            }
        }
        Ok(reply)
    }

    pub async fn event_profiling_info(
        &self,
        event: ObjectId,
        param: u32,
    ) -> Result<u64, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&GetEventProfilingInfo { param, id: event })
            .await?;
        state.stream.flush().await?;
        let value: PayloadValue<u64> = state.stream.recv().await?;
        Ok(value.0)
    }

    /// Blocks until all listed events complete.
    pub async fn wait_for_events(&self, events: &[ObjectId]) -> Result<(), ClientError> {
        let mut state = self.lock().await;
        state.stream.send(&WaitEvents).await?;
        state
            .stream
            .send(&IdListPacket {
                ids: events.to_vec(),
            })
            .await?;
        state.stream.flush().await?;
        state.stream.recv::<SuccessPacket>().await?;
        Ok(())
    }

    /// Registers a completion callback for an event.
    ///
    /// The callback is recorded locally (its registry slot is the wire
    /// callback ID) and registered with the server. It fires at most
    /// once, from the event-stream receiver task. When the event stream
    /// is down the registration still succeeds; the callback simply
    /// never fires.
    pub async fn register_event_callback(
        &self,
        event: ObjectId,
        callback_type: u32,
        callback: EventCallbackFn,
    ) -> Result<u32, ClientError> {
        let slot = self.callbacks().register(callback);
        if !self.event_stream_alive() {
            tracing::debug!(slot, "event stream is down; callback will not fire");
        }

        let mut state = self.lock().await;
        state
            .stream
            .send(&RegisterEventCallback {
                event,
                callback_id: slot,
                callback_type,
            })
            .await?;
        state.stream.flush().await?;
        state.stream.recv::<SuccessPacket>().await?;
        Ok(slot)
    }
}
