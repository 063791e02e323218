//! Search tool.
//!
//! Forwards a free-text query to the API's `/search` endpoint.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use crate::domains::tools::{ApiTool, ToolCall, ToolError};

/// Parameters for the search tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SearchParams {
    /// The search query string.
    #[schemars(description = "Search query")]
    pub query: String,

    /// Maximum number of results to return. Left to the API when unset.
    #[schemars(description = "Maximum number of results (API default when omitted)")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Search tool implementation.
#[derive(Debug, Clone, Default)]
pub struct SearchTool;

#[async_trait]
impl ApiTool for SearchTool {
    const NAME: &'static str = "search";

    const DESCRIPTION: &'static str =
        "Search the API. Returns the raw JSON search response for the given query.";

    type Params = SearchParams;

    #[instrument(skip_all, fields(query = %params.query))]
    async fn call(&self, call: ToolCall, params: SearchParams) -> Result<Value, ToolError> {
        let url = call.url(&["search"])?;
        info!("Searching {} (limit {:?})", url, params.limit);

        call.context.client().get_json(url, &params).await
    }
}
