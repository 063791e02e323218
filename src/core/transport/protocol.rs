//! JSON-RPC message handling shared by all transports.
//!
//! Supports the MCP subset a tool gateway needs: `initialize`, `ping`,
//! `tools/list`, `tools/call` and notifications.

use rmcp::model::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::core::{McpServer, Shutdown};
use crate::domains::tools::{ErrorCategory, InvocationRequest, InvocationResult};

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    /// Echoed request id; `null` when the request could not be decoded.
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Method not found error.
    pub fn method_not_found(id: Option<Value>) -> Self {
        Self::error(id, -32601, "Method not found")
    }

    /// Invalid request error.
    pub fn invalid_request(id: Option<Value>) -> Self {
        Self::error(id, -32600, "Invalid Request")
    }

    /// Response carrying a tool result.
    pub fn tool_result(id: Option<Value>, result: &InvocationResult) -> Self {
        // CallToolResult only holds strings and flags.
        let rendered = serde_json::to_value(result.to_call_tool_result()).unwrap_or(Value::Null);
        Self::success(id, rendered)
    }

    /// Response for a message that could not be decoded. `id` is echoed
    /// when the message was JSON carrying one.
    pub fn malformed(id: Option<Value>, detail: impl std::fmt::Display) -> Self {
        let failure = InvocationResult::failure(
            ErrorCategory::InvalidArgument,
            format!("malformed request: {detail}"),
        );
        Self::tool_result(id, &failure)
    }
}

/// Decode one raw message. Malformed input becomes a ready-made response.
pub fn decode(raw: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value = serde_json::from_str(raw).map_err(|e| {
        warn!("Malformed message: {}", e);
        JsonRpcResponse::malformed(None, e)
    })?;

    let id = value.get("id").filter(|id| !id.is_null()).cloned();
    serde_json::from_value(value).map_err(|e| {
        warn!("Invalid request shape: {}", e);
        JsonRpcResponse::malformed(id, e)
    })
}

/// A `tools/call` request split into tool name and arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: JsonObject,
}

impl ToolCallParams {
    /// Extract `{name, arguments}`. A missing or non-string name, or
    /// non-object arguments, is reported as an invalid-argument failure.
    pub fn parse(params: Option<&Value>) -> Result<Self, InvocationResult> {
        let invalid = |message: &str| {
            InvocationResult::failure(ErrorCategory::InvalidArgument, message.to_string())
        };

        let params = params.and_then(Value::as_object);
        let name = params
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| invalid("missing tool name"))?;

        let arguments = match params.and_then(|p| p.get("arguments")) {
            None | Some(Value::Null) => JsonObject::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => return Err(invalid("tool arguments must be an object")),
        };

        Ok(Self {
            name: name.to_string(),
            arguments,
        })
    }
}

/// How a request is to be handled.
#[derive(Debug)]
pub enum Routed {
    /// Answer is ready (or no answer for notifications).
    Immediate(Option<JsonRpcResponse>),
    /// A tool call that must be run through the dispatcher.
    Call {
        id: Option<Value>,
        params: ToolCallParams,
    },
}

/// Classify a request without running any tool.
pub fn route(server: &McpServer, request: JsonRpcRequest) -> Routed {
    if request.jsonrpc != "2.0" {
        return Routed::Immediate(Some(JsonRpcResponse::invalid_request(request.id)));
    }

    let response = match request.method.as_str() {
        "initialize" => {
            info!("Processing initialize request");
            JsonRpcResponse::success(request.id, server.initialize_result())
        }
        "ping" => JsonRpcResponse::success(request.id, json!({})),
        "tools/list" => {
            info!("Processing tools/list request");
            JsonRpcResponse::success(request.id, json!({ "tools": server.list_tools() }))
        }
        "tools/call" => {
            return match ToolCallParams::parse(request.params.as_ref()) {
                Ok(params) => Routed::Call {
                    id: request.id,
                    params,
                },
                Err(failure) => Routed::Immediate(Some(JsonRpcResponse::tool_result(
                    request.id, &failure,
                ))),
            };
        }
        method if method.starts_with("notifications/") => {
            debug!("Received notification: {}", method);
            return Routed::Immediate(None);
        }
        method => {
            warn!("Unknown method: {}", method);
            JsonRpcResponse::method_not_found(request.id)
        }
    };

    Routed::Immediate(Some(response))
}

/// Process a JSON-RPC request and return the response, if any.
#[instrument(skip_all, fields(method = %request.method))]
pub async fn process_request(server: &McpServer, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    match route(server, request) {
        Routed::Immediate(response) => response,
        Routed::Call { id, params } => {
            let result = server
                .invoke(InvocationRequest::new(params.name, params.arguments))
                .await;
            Some(JsonRpcResponse::tool_result(id, &result))
        }
    }
}

/// Like [`process_request`], but a tool call still running when `shutdown`
/// fires is dropped and answered with a "shutting down" failure.
#[instrument(skip_all, fields(method = %request.method))]
pub async fn process_until_shutdown(
    server: &McpServer,
    request: JsonRpcRequest,
    shutdown: &Shutdown,
) -> Option<JsonRpcResponse> {
    match route(server, request) {
        Routed::Immediate(response) => response,
        Routed::Call { id, params } => {
            let invocation = server.invoke(InvocationRequest::new(params.name, params.arguments));
            let result = tokio::select! {
                result = invocation => result,
                _ = shutdown.wait() => {
                    warn!("Aborting in-flight tool call");
                    InvocationResult::shutting_down()
                }
            };
            Some(JsonRpcResponse::tool_result(id, &result))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ServerConfig;
    use crate::core::context::tests::test_context;
    use crate::domains::tools::ToolRegistry;
    use crate::domains::tools::definitions::register_builtin;
    use std::sync::Arc;

    fn server() -> McpServer {
        let mut registry = ToolRegistry::new();
        register_builtin(&mut registry).unwrap();
        McpServer::new(
            ServerConfig::default(),
            Arc::new(test_context("http://127.0.0.1:9")),
            Arc::new(registry),
        )
    }

    fn request(raw: Value) -> JsonRpcRequest {
        serde_json::from_value(raw).unwrap()
    }

    #[tokio::test]
    async fn test_tools_list_in_registry_order() {
        let response = process_request(
            &server(),
            request(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})),
        )
        .await
        .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["tools"][0]["name"], "search");
        assert_eq!(result["tools"][1]["name"], "get_user");
        assert_eq!(result["tools"][1]["inputSchema"]["required"], json!(["user_id"]));
        assert_eq!(response.id, json!(1));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = process_request(
            &server(),
            request(json!({"jsonrpc": "2.0", "id": "a", "method": "resources/list"})),
        )
        .await
        .unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
        assert_eq!(response.id, json!("a"));
    }

    #[tokio::test]
    async fn test_notification_has_no_response() {
        let response = process_request(
            &server(),
            request(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})),
        )
        .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_call_without_name_is_invalid_argument() {
        let response = process_request(
            &server(),
            request(json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {}})),
        )
        .await
        .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Error: missing tool name");
    }

    #[tokio::test]
    async fn test_wrong_version_rejected() {
        let response = process_request(
            &server(),
            request(json!({"jsonrpc": "1.0", "id": 4, "method": "ping"})),
        )
        .await
        .unwrap();
        assert_eq!(response.error.unwrap().code, -32600);
    }

    #[test]
    fn test_decode_malformed() {
        let response = decode("{not json").unwrap_err();
        assert_eq!(response.id, Value::Null);
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert!(
            result["content"][0]["text"]
                .as_str()
                .unwrap()
                .starts_with("Error: malformed request")
        );
    }

    #[test]
    fn test_decode_invalid_shape_keeps_id() {
        let response = decode(r#"{"jsonrpc":"2.0","id":12,"params":{}}"#).unwrap_err();
        assert_eq!(response.id, json!(12));
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("method"), "{text}");

        let anonymous = decode(r#"[1, 2]"#).unwrap_err();
        assert_eq!(anonymous.id, Value::Null);
    }

    #[test]
    fn test_call_params_reject_non_object_arguments() {
        let failure =
            ToolCallParams::parse(Some(&json!({"name": "search", "arguments": [1]}))).unwrap_err();
        assert_eq!(failure.category(), Some(ErrorCategory::InvalidArgument));

        let params = ToolCallParams::parse(Some(&json!({"name": "search"}))).unwrap();
        assert!(params.arguments.is_empty());
    }
}
