//! User lookup tool.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use crate::domains::tools::{ApiTool, ToolCall, ToolError};

/// Parameters for the user lookup tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetUserParams {
    /// Identifier of the user to fetch.
    #[schemars(description = "User identifier")]
    pub user_id: String,

    /// Ask the API for the extended profile.
    #[schemars(description = "Include detailed profile information (default: false)")]
    #[serde(default)]
    pub include_details: bool,
}

/// `GET /users/{user_id}`.
#[derive(Debug, Clone, Default)]
pub struct GetUserTool;

#[async_trait]
impl ApiTool for GetUserTool {
    const NAME: &'static str = "get_user";

    const DESCRIPTION: &'static str = "Fetch a user's information by user ID.";

    type Params = GetUserParams;

    #[instrument(skip_all, fields(user_id = %params.user_id))]
    async fn call(&self, call: ToolCall, params: GetUserParams) -> Result<Value, ToolError> {
        let url = call.url(&["users", &params.user_id])?;
        info!("Fetching user from {}", url);

        let details = if params.include_details { "true" } else { "false" };
        call.context
            .client()
            .get_json(url, &[("details", details)])
            .await
    }
}
