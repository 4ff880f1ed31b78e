//! The client connection: handshake, locking and teardown.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::events::{spawn_receiver, CallbackRegistry};
use crate::registry::ObjectRegistry;
use remotecl_protocol::packets::event::OpenEventStream;
use remotecl_protocol::packets::TerminatePacket;
use remotecl_protocol::payload::PayloadValue;
use remotecl_protocol::version::FEATURE_EVENT_STREAM;
use remotecl_protocol::{ByteStream, PacketStream, TransportError, VersionPacket};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, MutexGuard};

/// Proxy slots preallocated at connect time; an estimate of a
/// connection's lifetime object population.
const REGISTRY_PREALLOCATION: usize = 64;

/// State guarded by the connection mutex: the primary stream and the
/// object registry move together under one lock, held for the full
/// request/response exchange of each call.
pub struct ConnState {
    pub(crate) stream: PacketStream,
    pub registry: ObjectRegistry,
}

/// A connection to a remotecl server.
///
/// One per process in the intended deployment; construction goes through
/// [`connect`](Connection::connect) (or [`handshake`](Connection::handshake)
/// with a caller-supplied socket, which is what tests use).
pub struct Connection {
    state: Mutex<ConnState>,
    callbacks: Arc<CallbackRegistry>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

impl Connection {
    /// Connects and handshakes using this configuration.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        tracing::debug!(host = %config.host, port = config.port, "connecting");
        let socket = TcpStream::connect((config.host.as_str(), config.port)).await?;
        Self::handshake(socket, &config.host).await
    }

    /// Performs the version handshake and event-stream negotiation over
    /// an established socket. `host` is reused for the event-stream
    /// connection.
    pub async fn handshake(socket: TcpStream, host: &str) -> Result<Self, ClientError> {
        let mut stream = PacketStream::new(ByteStream::from_tcp(socket));

        // The server speaks first; nothing is sent before the versions
        // are known compatible.
        let server_version: VersionPacket = stream.recv().await?;
        let ours = VersionPacket::new();
        if !ours.is_compatible_with(&server_version) {
            tracing::error!("server protocol version is not compatible, disconnecting");
            return Err(TransportError::VersionMismatch.into());
        }

        let callbacks = Arc::new(CallbackRegistry::new());

        if server_version.has_feature(FEATURE_EVENT_STREAM) {
            Self::negotiate_event_stream(&mut stream, host, &callbacks).await?;
        } else {
            tracing::debug!("server does not support an event stream");
        }

        Ok(Self {
            state: Mutex::new(ConnState {
                stream,
                registry: ObjectRegistry::with_capacity(REGISTRY_PREALLOCATION),
            }),
            callbacks,
        })
    }

    /// Asks the server for an event-stream port and connects to it. A
    /// refusal or a failed second connection degrades silently: calls
    /// all work, callbacks never fire.
    async fn negotiate_event_stream(
        stream: &mut PacketStream,
        host: &str,
        callbacks: &Arc<CallbackRegistry>,
    ) -> Result<(), ClientError> {
        stream.send(&OpenEventStream).await?;
        stream.flush().await?;
        let port: PayloadValue<u16> = stream.recv().await?;
        if port.0 == 0 {
            tracing::warn!("server refused to open an event stream");
            return Ok(());
        }

        match TcpStream::connect((host, port.0)).await {
            Ok(socket) => {
                let event_stream = PacketStream::new(ByteStream::from_tcp(socket));
                spawn_receiver(event_stream, callbacks.clone());
                tracing::debug!(port = port.0, "event stream established");
            }
            Err(err) => {
                tracing::warn!(%err, "event stream could not be opened");
            }
        }
        Ok(())
    }

    /// Acquires the connection lock. Calls hold it for their entire
    /// exchange; long operations (finish, blocking reads) hold it for
    /// their full duration by design.
    pub async fn lock(&self) -> MutexGuard<'_, ConnState> {
        self.state.lock().await
    }

    pub(crate) fn callbacks(&self) -> &Arc<CallbackRegistry> {
        &self.callbacks
    }

    /// Whether the out-of-band event stream is currently delivering.
    pub fn event_stream_alive(&self) -> bool {
        self.callbacks.stream_alive()
    }

    /// Announces teardown to the server. Best-effort: the socket closing
    /// carries the same information.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        let _ = state.stream.send(&TerminatePacket).await;
        let _ = state.stream.flush().await;
        let _ = state.stream.shutdown().await;
    }
}
