//! MCP gateway for an external HTTP API.
//!
//! Exposes a fixed set of named tools to an MCP client. Each tool call is
//! validated against the tool's input schema, turned into one authenticated
//! request against the configured API, and answered with the API's JSON
//! response or a categorized error message.
//!
//! # Architecture
//!
//! - **core**: configuration, the server context and its lifecycle, error
//!   handling, the MCP server facade and the transports
//! - **domains::tools**: tool registry, schema validation, dispatch and the
//!   built-in tool definitions
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use api_gateway_mcp::core::{CliArgs, Config, ContextScope, McpServer, ServerContext, Shutdown};
//! use api_gateway_mcp::domains::tools::{ToolRegistry, definitions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(CliArgs::default());
//!
//!     let mut registry = ToolRegistry::new();
//!     definitions::register_builtin(&mut registry)?;
//!
//!     let context = Arc::new(ServerContext::acquire(&config)?);
//!     ContextScope::run(context, |context| async move {
//!         let server = McpServer::new(config.server, context, Arc::new(registry));
//!         api_gateway_mcp::core::TransportService::new(config.transport)
//!             .run(server, Shutdown::new())
//!             .await
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
