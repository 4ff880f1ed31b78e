//! TCP accept loop.

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::instance::ServerInstance;
use crate::native::NativeBackend;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// Server statistics.
#[derive(Debug, Default)]
pub struct ServerStats {
    pub connections_total: AtomicU64,
    pub connections_active: AtomicU64,
    pub errors_total: AtomicU64,
}

/// Accepts connections and runs one [`ServerInstance`] per client.
pub struct Server<B: NativeBackend> {
    config: ServerConfig,
    backend: Arc<B>,
    stats: Arc<ServerStats>,
    shutdown: broadcast::Sender<()>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl<B: NativeBackend> Server<B> {
    pub fn new(config: ServerConfig, backend: B) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            config,
            backend: Arc::new(backend),
            stats: Arc::new(ServerStats::default()),
            shutdown,
            local_addr: Mutex::new(None),
        }
    }

    /// Binds the configured address and serves until shutdown.
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.run_on(listener).await
    }

    /// Serves on an already bound listener. Tests bind port 0 themselves
    /// and read the address back.
    pub async fn run_on(&self, listener: TcpListener) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        *self.local_addr.lock().unwrap() = Some(addr);
        tracing::info!(%addr, "server listening");

        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((socket, peer)) => self.spawn_connection(socket, peer),
                        Err(err) => {
                            tracing::error!(%err, "accept error");
                            self.stats.errors_total.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("server shutting down");
                    return Ok(());
                }
            }
        }
    }

    fn spawn_connection(&self, socket: tokio::net::TcpStream, peer: SocketAddr) {
        if self.stats.connections_active.load(Ordering::Relaxed)
            >= self.config.max_connections as u64
        {
            tracing::warn!(%peer, "connection limit reached, rejecting");
            return;
        }
        self.stats.connections_total.fetch_add(1, Ordering::Relaxed);
        self.stats.connections_active.fetch_add(1, Ordering::Relaxed);
        tracing::info!(%peer, "client connected");

        let backend = self.backend.clone();
        let config = self.config.clone();
        let stats = self.stats.clone();

        tokio::spawn(async move {
            let mut instance = ServerInstance::new(socket, peer, backend, config);
            if let Err(err) = instance.run().await {
                tracing::debug!(%peer, %err, "connection ended with error");
                stats.errors_total.fetch_add(1, Ordering::Relaxed);
            }
            stats.connections_active.fetch_sub(1, Ordering::Relaxed);
            tracing::info!(%peer, "client disconnected");
        });
    }

    /// The bound address, once `run` has started listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap()
    }

    /// Initiates shutdown of the accept loop. Established connections run
    /// to completion on their own tasks.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }
}
