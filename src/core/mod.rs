//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the MCP server,
//! including error handling, configuration, the server context and its
//! lifecycle, shutdown signalling and transport layer abstractions.

pub mod config;
pub mod context;
pub mod error;
pub mod server;
pub mod shutdown;
pub mod transport;

pub use config::{CliArgs, Config, ConfigSources, LoggingConfig};
pub use context::{BaseUrls, ContextScope, Credential, ServerContext};
pub use error::{Error, Result};
pub use server::McpServer;
pub use shutdown::Shutdown;
pub use transport::{TransportConfig, TransportService};
