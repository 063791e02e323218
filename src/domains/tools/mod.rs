//! Tools domain module.
//!
//! This module handles all tool-related functionality for the MCP server.
//! Tools are named, schema-validated operations that each wrap one call
//! against the external API.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `schema.rs` - Argument validation against the generated input schema
//! - `registry.rs` - Name → (descriptor, handler) table
//! - `dispatcher.rs` - Resolve, validate, invoke, shape the result
//! - `error.rs` - Tool error types and caller-facing categories
//! - `client.rs` - Authenticated outbound HTTP client
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` (e.g., `my_tool.rs`)
//! 2. Define a params struct and implement [`ApiTool`]
//! 3. Register it in `definitions::register_builtin`
//! 4. Add a base URL entry in `ApiConfig::default_base_urls` if it does not
//!    use the default one

pub mod client;
pub mod definitions;
pub mod dispatcher;
mod error;
mod handlers;
mod registry;
pub mod schema;

pub use client::ApiClient;
pub use dispatcher::{ContentBlock, ContentKind, Dispatcher, InvocationRequest, InvocationResult};
pub use error::{ErrorCategory, ToolError};
pub use handlers::{ApiTool, FnToolHandler, ToolCall, ToolHandler, TypedHandler};
pub use registry::{
    DuplicateToolError, RegisteredTool, ToolDescriptor, ToolNotFoundError, ToolRegistry,
};
pub use schema::{SchemaContract, ValidatedArguments, ValidationFailure};
