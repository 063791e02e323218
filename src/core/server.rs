//! MCP server facade.
//!
//! Holds what every transport needs to answer MCP requests: the server
//! identity, the acquired [`ServerContext`] and the tool [`Dispatcher`].
//! Transports decode messages and call into this type; they never touch the
//! registry or the context directly.

use std::sync::Arc;

use rmcp::model::{CallToolResult, JsonObject, ServerCapabilities, Tool};
use serde_json::{Value, json};
use tracing::{info, instrument};

use super::config::ServerConfig;
use super::context::ServerContext;
use crate::domains::tools::{Dispatcher, InvocationRequest, InvocationResult, ToolRegistry};

/// Protocol revision advertised in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    /// Server identification.
    info: Arc<ServerConfig>,

    /// Context shared read-only with every tool call.
    context: Arc<ServerContext>,

    /// Routes tool calls through the registry.
    dispatcher: Dispatcher,
}

impl McpServer {
    /// Create a new MCP server over an acquired context.
    pub fn new(info: ServerConfig, context: Arc<ServerContext>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            info: Arc::new(info),
            context,
            dispatcher: Dispatcher::new(registry),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.info.version
    }

    pub fn context(&self) -> &Arc<ServerContext> {
        &self.context
    }

    /// Result of the `initialize` handshake.
    pub fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": ServerCapabilities::builder().enable_tools().build(),
            "serverInfo": {
                "name": self.name(),
                "version": self.version()
            },
            "instructions": "Each tool wraps one call to the configured HTTP API. \
                             Results are the API's JSON response as text."
        })
    }

    /// Tool descriptors in registration order.
    pub fn list_tools(&self) -> Vec<Tool> {
        self.dispatcher.registry().to_tools()
    }

    /// Run one invocation to completion.
    pub async fn invoke(&self, request: InvocationRequest) -> InvocationResult {
        self.dispatcher.dispatch(&self.context, request).await
    }

    /// Call a tool by name and render the outcome as an MCP tool result.
    #[instrument(skip(self, arguments))]
    pub async fn call_tool(&self, name: &str, arguments: JsonObject) -> CallToolResult {
        info!("Calling tool: {}", name);
        self.invoke(InvocationRequest::new(name, arguments))
            .await
            .to_call_tool_result()
    }
}
