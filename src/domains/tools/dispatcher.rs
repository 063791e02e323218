//! Request dispatcher.
//!
//! Single entry point for tool invocations: resolves the tool, picks its base
//! URL, validates arguments, runs the handler and shapes the outcome into an
//! [`InvocationResult`]. Every invocation yields a result; handler errors and
//! panics are translated here and never reach the transport.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use rmcp::model::{CallToolResult, Content, JsonObject};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::error::{ErrorCategory, ToolError};
use super::handlers::ToolCall;
use super::registry::ToolRegistry;
use super::schema;
use crate::core::ServerContext;

// ============================================================================
// Invocation model
// ============================================================================

/// A decoded tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub tool_name: String,
    #[serde(default)]
    pub raw_arguments: JsonObject,
}

impl InvocationRequest {
    pub fn new(tool_name: impl Into<String>, raw_arguments: JsonObject) -> Self {
        Self {
            tool_name: tool_name.into(),
            raw_arguments,
        }
    }
}

/// Kind of a content block. Only text is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
}

/// One block of a successful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub kind: ContentKind,
    pub value: String,
}

impl ContentBlock {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Text,
            value: value.into(),
        }
    }
}

/// Outcome of exactly one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationResult {
    Success(Vec<ContentBlock>),
    Failure {
        category: ErrorCategory,
        message: String,
    },
}

impl InvocationResult {
    /// Success with a single text block.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Success(vec![ContentBlock::text(value)])
    }

    pub fn failure(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self::Failure {
            category,
            message: message.into(),
        }
    }

    /// Result for an invocation aborted by server shutdown.
    pub fn shutting_down() -> Self {
        Self::failure(ErrorCategory::Internal, "shutting down")
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Failure category, if any.
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Success(_) => None,
            Self::Failure { category, .. } => Some(*category),
        }
    }

    /// Render as an MCP tool result.
    ///
    /// Failures become a single text block prefixed with `Error: `.
    pub fn to_call_tool_result(&self) -> CallToolResult {
        match self {
            Self::Success(blocks) => CallToolResult::success(
                blocks
                    .iter()
                    .map(|block| Content::text(block.value.clone()))
                    .collect(),
            ),
            Self::Failure { message, .. } => {
                CallToolResult::error(vec![Content::text(format!("Error: {message}"))])
            }
        }
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Routes invocations through the registry to their handlers.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Dispatch one invocation. Never fails; errors become `Failure` results.
    #[instrument(skip_all, fields(tool = %request.tool_name))]
    pub async fn dispatch(
        &self,
        context: &Arc<ServerContext>,
        request: InvocationRequest,
    ) -> InvocationResult {
        info!("Tool call: {}", request.tool_name);
        debug!(arguments = ?request.raw_arguments, "Tool arguments");

        match self.run(context, &request).await {
            Ok(response) => match serde_json::to_string(&response) {
                Ok(text) => InvocationResult::text(text),
                Err(e) => ToolError::internal(e.to_string()).into_failure(&request.tool_name),
            },
            Err(e) => e.into_failure(&request.tool_name),
        }
    }

    async fn run(
        &self,
        context: &Arc<ServerContext>,
        request: &InvocationRequest,
    ) -> Result<Value, ToolError> {
        let name = request.tool_name.as_str();

        let entry = self
            .registry
            .resolve(name)
            .map_err(|e| ToolError::not_found(e.0))?;

        let base_url = context
            .base_urls()
            .resolve(name)
            .ok_or_else(|| ToolError::MissingBaseUrl(name.to_string()))?;

        let arguments = schema::validate(entry.descriptor.contract(), &request.raw_arguments)?;

        let call = ToolCall {
            context: Arc::clone(context),
            base_url: base_url.to_string(),
        };

        AssertUnwindSafe(entry.handler.invoke(call, arguments))
            .catch_unwind()
            .await
            .map_err(|panic| {
                ToolError::internal(format!("handler panicked: {}", panic_message(&*panic)))
            })?
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
