//! The event-callback registry and the out-of-band receiver task.

use remotecl_protocol::packets::event::{CallbackTrigger, EventCallbackTrigger};
use remotecl_protocol::{PacketStream, PacketTag};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A registered completion callback, invoked with the command execution
/// status.
pub type EventCallbackFn = Box<dyn FnOnce(i32) + Send>;

/// Append-only callback registry.
///
/// The slot index is the callback ID sent over the wire; slots are never
/// reused, and a callback fires at most once — it is taken out of its
/// slot before invocation and later triggers for the same slot are
/// dropped.
#[derive(Default)]
pub struct CallbackRegistry {
    slots: Mutex<Vec<Option<EventCallbackFn>>>,
    /// Cleared by the receiver task when the event stream dies. Later
    /// registrations still succeed; they just never fire.
    stream_alive: AtomicBool,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
            stream_alive: AtomicBool::new(false),
        }
    }

    /// Appends a callback and returns its slot index.
    pub fn register(&self, callback: EventCallbackFn) -> u32 {
        let mut slots = self.slots.lock().unwrap();
        slots.push(Some(callback));
        (slots.len() - 1) as u32
    }

    /// Fires the callback in `slot`, at most once.
    pub fn fire(&self, slot: u32, status: i32) {
        let callback = {
            let mut slots = self.slots.lock().unwrap();
            match slots.get_mut(slot as usize) {
                Some(entry) => entry.take(),
                None => None,
            }
        };
        match callback {
            // Invoked outside the lock: the callback may re-enter the
            // library.
            Some(callback) => callback(status),
            None => {
                tracing::warn!(slot, "spurious event trigger ignored");
            }
        }
    }

    pub fn mark_stream_alive(&self) {
        self.stream_alive.store(true, Ordering::SeqCst);
    }

    pub fn mark_stream_dead(&self) {
        self.stream_alive.store(false, Ordering::SeqCst);
    }

    pub fn stream_alive(&self) -> bool {
        self.stream_alive.load(Ordering::SeqCst)
    }
}

/// Spawns the detached receiver that dispatches callback triggers from
/// the event stream.
///
/// The task never touches the primary stream and exits on the first
/// terminate, unknown packet or stream failure, clearing the liveness
/// flag on its way out.
pub(crate) fn spawn_receiver(
    mut stream: PacketStream,
    registry: Arc<CallbackRegistry>,
) -> tokio::task::JoinHandle<()> {
    registry.mark_stream_alive();
    tokio::spawn(async move {
        loop {
            let tag = match stream.next_tag().await {
                Ok(tag) => tag,
                Err(_) => PacketTag::Terminate,
            };
            match tag {
                PacketTag::Terminate => break,
                PacketTag::CallbackTrigger => {
                    let trigger: CallbackTrigger = match stream.recv().await {
                        Ok(packet) => packet,
                        Err(err) => {
                            tracing::warn!(%err, "event stream read failed");
                            break;
                        }
                    };
                    let status: EventCallbackTrigger = match stream.recv().await {
                        Ok(packet) => packet,
                        Err(err) => {
                            tracing::warn!(%err, "event stream read failed");
                            break;
                        }
                    };
                    registry.fire(trigger.0, status.0);
                }
                other => {
                    tracing::error!(?other, "unexpected packet on event stream");
                    break;
                }
            }
        }
        tracing::debug!("event stream receiver exiting");
        registry.mark_stream_dead();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn slots_are_appended_and_never_reused() {
        let registry = CallbackRegistry::new();
        assert_eq!(registry.register(Box::new(|_| {})), 0);
        assert_eq!(registry.register(Box::new(|_| {})), 1);
        registry.fire(0, 0);
        // Slot 0 fired but its index is not handed out again.
        assert_eq!(registry.register(Box::new(|_| {})), 2);
    }

    #[test]
    fn callbacks_fire_at_most_once() {
        let registry = CallbackRegistry::new();
        let count = Arc::new(AtomicU32::new(0));
        let seen = count.clone();
        let slot = registry.register(Box::new(move |status| {
            assert_eq!(status, 0);
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        registry.fire(slot, 0);
        registry.fire(slot, 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_slots_are_ignored() {
        let registry = CallbackRegistry::new();
        registry.fire(99, 0);
    }
}
