//! Tool handler traits.
//!
//! Tools are written against [`ApiTool`], which receives typed parameters.
//! The registry stores them type-erased as [`ToolHandler`] trait objects that
//! accept [`ValidatedArguments`]; [`TypedHandler`] bridges the two.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ToolError;
use super::schema::ValidatedArguments;
use crate::core::ServerContext;

/// Everything a handler gets besides its arguments.
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// Read-only process context (credential, client, URL table).
    pub context: Arc<ServerContext>,

    /// Base URL resolved for this tool.
    pub base_url: String,
}

impl ToolCall {
    /// Build a URL by appending percent-encoded path segments to the base URL.
    pub fn url(&self, segments: &[&str]) -> Result<Url, ToolError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ToolError::internal(format!("invalid base URL {}: {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ToolError::internal(format!("base URL {} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// A tool backed by one call against the external API.
///
/// Implementors declare their name, description and parameter type; the
/// input schema is generated from `Params`.
#[async_trait]
pub trait ApiTool: Send + Sync + 'static {
    /// Tool name as registered in MCP.
    const NAME: &'static str;

    /// Tool description shown to clients.
    const DESCRIPTION: &'static str;

    /// Typed, validated arguments.
    type Params: DeserializeOwned + JsonSchema + Send + 'static;

    /// Perform the upstream call and return its JSON response.
    async fn call(&self, call: ToolCall, params: Self::Params) -> Result<Value, ToolError>;
}

/// Type-erased handler stored in the registry.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn invoke(&self, call: ToolCall, args: ValidatedArguments) -> Result<Value, ToolError>;
}

/// Adapts an [`ApiTool`] to [`ToolHandler`].
pub struct TypedHandler<T>(pub T);

#[async_trait]
impl<T: ApiTool> ToolHandler for TypedHandler<T> {
    async fn invoke(&self, call: ToolCall, args: ValidatedArguments) -> Result<Value, ToolError> {
        let params = args.into_typed::<T::Params>()?;
        self.0.call(call, params).await
    }
}

/// Wraps an async closure into a ToolHandler.
pub struct FnToolHandler<F> {
    f: F,
}

impl<F, Fut> FnToolHandler<F>
where
    F: Fn(ToolCall, ValidatedArguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    pub fn new(f: F) -> Arc<dyn ToolHandler> {
        Arc::new(Self { f })
    }
}

#[async_trait]
impl<F, Fut> ToolHandler for FnToolHandler<F>
where
    F: Fn(ToolCall, ValidatedArguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    async fn invoke(&self, call: ToolCall, args: ValidatedArguments) -> Result<Value, ToolError> {
        (self.f)(call, args).await
    }
}
