//! # remotecl-server
//!
//! Server side of the remotecl remoting layer. Each accepted connection
//! gets its own [`ServerInstance`]: a private handle table and a dispatch
//! loop that re-issues every incoming request against the native backend
//! and writes exactly one response.

pub mod config;
pub mod error;
pub mod handles;
pub mod instance;
pub mod native;
pub mod server;

mod handlers;

pub use config::ServerConfig;
pub use error::ServerError;
pub use handles::HandleTable;
pub use instance::ServerInstance;
pub use native::{
    ImageDesc, ImageFormat, InfoResult, KernelArgKind, NativeBackend, NativeHandle, RectTransfer,
    Status,
};
pub use server::Server;
