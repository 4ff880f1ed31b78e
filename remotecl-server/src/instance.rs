//! One accepted connection: handle table, dispatch loop, event channel.

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::handles::HandleTable;
use crate::native::{InfoResult, NativeBackend, NativeHandle, Status};
use rand::Rng;
use remotecl_protocol::packets::event::{CallbackTrigger, EventCallbackTrigger, OpenEventStream};
use remotecl_protocol::packets::{ErrorPacket, IdListPacket, IdPacket, TerminatePacket};
use remotecl_protocol::payload::{Payload, PayloadValue};
use remotecl_protocol::{ByteStream, ObjectId, PacketStream, PacketTag, VersionPacket};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A callback firing, carried from a native thread to the event-stream
/// writer task.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CallbackFire {
    pub slot: u32,
    pub status: i32,
}

/// Serves one client connection.
pub struct ServerInstance<B: NativeBackend> {
    pub(crate) stream: PacketStream,
    pub(crate) handles: HandleTable,
    pub(crate) backend: Arc<B>,
    pub(crate) peer: SocketAddr,
    config: ServerConfig,
    /// Present once the client has negotiated an event stream. Native
    /// callbacks send through this; a dedicated task owns the stream
    /// itself, so callbacks never block on networking.
    pub(crate) event_tx: Option<mpsc::UnboundedSender<CallbackFire>>,
    event_task: Option<JoinHandle<()>>,
}

impl<B: NativeBackend> ServerInstance<B> {
    pub fn new(socket: TcpStream, peer: SocketAddr, backend: Arc<B>, config: ServerConfig) -> Self {
        Self {
            stream: PacketStream::new(ByteStream::from_tcp(socket)),
            handles: HandleTable::new(),
            backend,
            peer,
            config,
            event_tx: None,
            event_task: None,
        }
    }

    /// Runs the dispatch loop until the client terminates, the socket
    /// breaks, or a handler fails unrecoverably.
    pub async fn run(&mut self) -> Result<(), ServerError> {
        self.stream.send(&VersionPacket::new()).await?;
        self.stream.flush().await?;

        loop {
            let proceed = match self.handle_next_packet().await {
                Ok(proceed) => proceed,
                Err(err) => match err.exhaustion_status() {
                    // Resource exhaustion is reported in-band; the
                    // connection keeps going.
                    Some(code) => {
                        tracing::warn!(peer = %self.peer, %err, "request exhausted resources");
                        self.stream.send(&ErrorPacket(code)).await?;
                        true
                    }
                    None => {
                        self.close_event_stream().await;
                        return Err(err);
                    }
                },
            };
            self.stream.flush().await?;
            if !proceed {
                break;
            }
        }

        self.close_event_stream().await;
        Ok(())
    }

    async fn handle_next_packet(&mut self) -> Result<bool, ServerError> {
        let tag = self.stream.next_tag().await?;
        match tag {
            PacketTag::Terminate => {
                tracing::debug!(peer = %self.peer, "client terminated connection");
                return Ok(false);
            }

            PacketTag::GetPlatformIDs => self.send_platform_list().await?,
            PacketTag::GetPlatformInfo => self.get_platform_info().await?,
            PacketTag::GetDeviceIDs => self.send_device_list().await?,
            PacketTag::GetDeviceInfo => self.get_device_info().await?,

            PacketTag::Retain => self.handle_retain().await?,
            PacketTag::Release => self.handle_release().await?,

            PacketTag::CreateContext => self.create_context().await?,
            PacketTag::CreateContextFromType => self.create_context_from_type().await?,
            PacketTag::GetContextInfo => self.get_context_info().await?,
            PacketTag::GetImageFormats => self.get_image_formats().await?,

            PacketTag::CreateQueue => self.create_queue().await?,
            PacketTag::CreateQueueWithProp => self.create_queue_with_properties().await?,
            PacketTag::GetQueueInfo => self.get_queue_info().await?,
            PacketTag::Flush => self.flush_queue().await?,
            PacketTag::Finish => self.finish_queue().await?,

            PacketTag::CreateSourceProgram => self.create_program_from_source().await?,
            PacketTag::CreateBinaryProgram => self.create_program_from_binary().await?,
            PacketTag::BuildProgram => self.build_program().await?,
            PacketTag::BuildInfo => self.get_program_build_info().await?,
            PacketTag::ProgramInfo => self.get_program_info().await?,

            PacketTag::CreateKernel => self.create_kernel().await?,
            PacketTag::CreateKernels => self.create_kernels().await?,
            PacketTag::CloneKernel => self.clone_kernel().await?,
            PacketTag::SetKernelArg => self.set_kernel_arg().await?,
            PacketTag::KernelWGInfo => self.get_kernel_wg_info().await?,
            PacketTag::KernelInfo => self.get_kernel_info().await?,
            PacketTag::KernelArgInfo => self.get_kernel_arg_info().await?,

            PacketTag::CreateBuffer => self.create_buffer().await?,
            PacketTag::CreateSubBuffer => self.create_sub_buffer().await?,
            PacketTag::ReadBuffer => self.read_buffer().await?,
            PacketTag::ReadBufferRect => self.read_buffer_rect().await?,
            PacketTag::WriteBuffer => self.write_buffer().await?,
            PacketTag::FillBuffer => self.fill_buffer().await?,
            PacketTag::GetMemObjInfo => self.get_mem_obj_info().await?,

            PacketTag::CreateImage => self.create_image().await?,
            PacketTag::ReadImage => self.read_image().await?,
            PacketTag::WriteImage => self.write_image().await?,
            PacketTag::GetImageInfo => self.get_image_info().await?,

            PacketTag::EnqueueKernel => self.enqueue_kernel().await?,

            PacketTag::WaitEvents => self.wait_for_events().await?,
            PacketTag::CreateUserEvent => self.create_user_event().await?,
            PacketTag::SetUserEventStatus => self.set_user_event_status().await?,
            PacketTag::GetEventInfo => self.get_event_info().await?,
            PacketTag::GetEventProfilingInfo => self.get_event_profiling_info().await?,
            PacketTag::RegisterEventCallback => self.register_event_callback().await?,

            // Repeated opens are harmless; the newest stream wins.
            PacketTag::EventStreamOpen => self.open_event_stream().await?,

            // The client never originates these.
            PacketTag::Version
            | PacketTag::Payload
            | PacketTag::Success
            | PacketTag::Error
            | PacketTag::Id
            | PacketTag::IdList
            | PacketTag::CallbackTrigger
            | PacketTag::EventCallbackTrigger => {
                tracing::error!(peer = %self.peer, ?tag, "unexpected packet from client");
                return Ok(false);
            }
        }
        Ok(true)
    }

    // ---------------------------------------------------------------
    // Event channel
    // ---------------------------------------------------------------

    /// Handles an event-stream negotiation request.
    ///
    /// Binds a listener on a random port in the IANA ephemeral range,
    /// retrying a bounded number of times, reports the port (or 0 on
    /// failure) and waits for the client to connect.
    async fn open_event_stream(&mut self) -> Result<(), ServerError> {
        self.stream.recv::<OpenEventStream>().await?;

        const PORT_MIN: u16 = 49152;
        const PORT_MAX: u16 = 65535;
        const BIND_ATTEMPTS: u32 = 16;

        let mut listener = None;
        for _ in 0..BIND_ATTEMPTS {
            let port = rand::thread_rng().gen_range(PORT_MIN..=PORT_MAX);
            match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
                Ok(bound) => {
                    listener = Some((bound, port));
                    break;
                }
                Err(err) => {
                    tracing::debug!(port, %err, "event-stream bind attempt failed");
                }
            }
        }

        let Some((listener, port)) = listener else {
            tracing::warn!(peer = %self.peer, "could not open an event-stream port");
            self.stream.send(&PayloadValue(0u16)).await?;
            return Ok(());
        };

        // Tell the client where to connect before accepting; the window
        // between the reply and accept() is unavoidable.
        self.stream.send(&PayloadValue(port)).await?;
        self.stream.flush().await?;

        let accepted =
            tokio::time::timeout(self.config.event_accept_timeout, listener.accept()).await;
        match accepted {
            Ok(Ok((socket, _))) => {
                tracing::debug!(peer = %self.peer, port, "event stream established");
                self.spawn_event_writer(socket);
            }
            Ok(Err(err)) => {
                tracing::warn!(peer = %self.peer, %err, "event-stream accept failed");
            }
            Err(_) => {
                tracing::warn!(peer = %self.peer, "client never connected to the event stream");
            }
        }
        Ok(())
    }

    /// Spawns the task that owns the event stream. Native callbacks fan in
    /// through a channel; only this task writes to the socket, which keeps
    /// the stream ordered without sharing a lock with the dispatch loop.
    fn spawn_event_writer(&mut self, socket: TcpStream) {
        let (tx, mut rx) = mpsc::unbounded_channel::<CallbackFire>();
        let mut stream = PacketStream::new(ByteStream::from_tcp(socket));
        let peer = self.peer;

        let task = tokio::spawn(async move {
            while let Some(fire) = rx.recv().await {
                let written = async {
                    stream.send(&CallbackTrigger(fire.slot)).await?;
                    stream.send(&EventCallbackTrigger(fire.status)).await?;
                    stream.flush().await
                }
                .await;
                if let Err(err) = written {
                    tracing::warn!(%peer, %err, "event stream write failed");
                    return;
                }
            }
            // Channel closed: the connection is going away.
            let _ = stream.send(&TerminatePacket).await;
            let _ = stream.flush().await;
        });

        self.event_tx = Some(tx);
        self.event_task = Some(task);
    }

    async fn close_event_stream(&mut self) {
        self.event_tx = None;
        if let Some(task) = self.event_task.take() {
            let _ = task.await;
        }
    }

    // ---------------------------------------------------------------
    // Handler plumbing
    // ---------------------------------------------------------------

    /// Writes the single in-band error response for a failed native call.
    pub(crate) async fn reply_error(&mut self, code: Status) -> Result<(), ServerError> {
        self.stream.send(&ErrorPacket(code)).await?;
        Ok(())
    }

    /// Writes the response for an info query, mapping returned handles
    /// into the connection's ID space.
    pub(crate) async fn reply_info(&mut self, info: InfoResult) -> Result<(), ServerError> {
        match info {
            InfoResult::Bytes(bytes) => {
                self.stream.send(&Payload::<u32>::new(bytes)).await?;
            }
            InfoResult::Handle(handle) => {
                let id = self.handles.id_for(handle)?;
                self.stream.send(&IdPacket(id)).await?;
            }
            InfoResult::Handles(handles) => {
                let ids = self.ids_for(&handles)?;
                self.stream.send(&IdListPacket { ids }).await?;
            }
            InfoResult::Binaries(binaries) => {
                self.stream.send(&PayloadValue(binaries.len() as u8)).await?;
                for binary in binaries {
                    self.stream.send(&Payload::<u32>::new(binary)).await?;
                }
            }
        }
        Ok(())
    }

    /// Reads the event wait list that follows a command packet when
    /// announced, resolving the IDs to native handles.
    pub(crate) async fn read_wait_list(
        &mut self,
        expect: bool,
    ) -> Result<Vec<NativeHandle>, ServerError> {
        if !expect {
            return Ok(Vec::new());
        }
        let list = self.stream.recv::<IdListPacket>().await?;
        Ok(list.ids.iter().map(|&id| self.handles.get(id)).collect())
    }

    pub(crate) fn ids_for(
        &mut self,
        handles: &[NativeHandle],
    ) -> Result<Vec<ObjectId>, ServerError> {
        handles
            .iter()
            .map(|&handle| self.handles.id_for(handle))
            .collect()
    }

    /// Writes the optional event `Id` that precedes a command's final
    /// response.
    pub(crate) async fn reply_event(
        &mut self,
        event: Option<NativeHandle>,
    ) -> Result<(), ServerError> {
        if let Some(event) = event {
            let id = self.handles.id_for(event)?;
            self.stream.send(&IdPacket(id)).await?;
        }
        Ok(())
    }
}
