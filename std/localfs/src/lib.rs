//! MCP server providing local filesystem tools.
//!
//! Scans and searches directories, extracts per-file metadata, performs
//! basic file operations and keeps named collections under a data root.
//! The filesystem work is synchronous and runs on the blocking pool.

use rmcp::{
    ServerHandler,
    handler::server::router::tool::ToolRouter,
    model::{Implementation, ServerCapabilities, ServerInfo},
    tool_handler,
};
use std::sync::Arc;

pub mod classify;
pub mod collection;
pub mod config;
pub mod error;
pub mod media;
pub mod ops;
pub mod path;
pub mod platform;
pub mod record;
pub mod search;
pub mod tools;
pub mod walk;

pub use config::DataRoots;
pub use error::{FsError, FsResult};

/// MCP local filesystem server.
#[derive(Debug, Clone)]
pub struct LocalFsServer {
    pub(crate) roots: DataRoots,
    pub(crate) platform: Arc<dyn platform::Platform>,
    pub(crate) media: Arc<dyn media::MediaBackend>,
    pub(crate) tool_router: ToolRouter<Self>,
}

#[tool_handler]
impl ServerHandler for LocalFsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "wmcp-localfs".into(),
                title: Some("Walrus MCP Local Filesystem Server".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Local filesystem server for scanning, searching, reading and organizing files. \
                 Failures are returned as {\"error\": message}."
                    .into(),
            ),
        }
    }
}
