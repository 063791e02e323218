//! Tool-specific error types and their translation into caller-facing failures.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use super::dispatcher::InvocationResult;
use super::schema::ValidationFailure;

/// Closed set of failure categories reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The caller sent bad input; retrying with corrected input may succeed.
    InvalidArgument,
    /// No tool with the requested name.
    NotFound,
    /// The server is misconfigured.
    Configuration,
    /// The external API failed; may be transient.
    UpstreamError,
    /// Unexpected fault. Detail is logged, never returned.
    Internal,
}

/// Errors that can occur during tool operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("unknown tool '{0}'")]
    NotFound(String),

    /// Invalid arguments were provided to the tool.
    #[error(transparent)]
    InvalidArguments(#[from] ValidationFailure),

    /// No base URL is configured for the tool, and no default either.
    #[error("no API URL configured for '{0}'")]
    MissingBaseUrl(String),

    /// The upstream API answered with a non-success status.
    #[error("{status}: request failed")]
    Upstream { status: u16 },

    /// The outbound request exceeded its timeout.
    #[error("request timed out")]
    Timeout,

    /// Transport-level failure talking to the upstream API.
    #[error("http error: {0}")]
    Http(reqwest::Error),

    /// The upstream response could not be decoded.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Upstream {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Category this error is reported under.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::InvalidArguments(_) => ErrorCategory::InvalidArgument,
            Self::MissingBaseUrl(_) => ErrorCategory::Configuration,
            Self::Upstream { .. } | Self::Timeout => ErrorCategory::UpstreamError,
            Self::Http(_) | Self::Decode(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Translate into the failure returned to the caller.
    ///
    /// Internal faults are logged with full detail here and replaced by a
    /// generic message naming only the tool.
    pub fn into_failure(self, tool: &str) -> InvocationResult {
        let category = self.category();
        let message = match category {
            ErrorCategory::Internal => {
                error!(tool, error = %self, "Tool execution failed");
                debug!(tool, error = ?self, "Tool failure detail");
                format!("internal error while running tool '{tool}'")
            }
            ErrorCategory::UpstreamError => {
                warn!(tool, error = %self, "Upstream API call failed");
                self.to_string()
            }
            _ => {
                warn!(tool, error = %self, "Tool call rejected");
                self.to_string()
            }
        };
        InvocationResult::failure(category, message)
    }
}
