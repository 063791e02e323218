//! Error types and handling for the MCP server.
//!
//! This module defines the process-level error type. Per-invocation failures
//! never surface here: they are reported to the caller as tool results by the
//! dispatcher. What remains are faults that stop the server, such as a
//! missing credential at startup or a transport that cannot bind.

use thiserror::Error;

use super::transport::TransportError;
use crate::domains::tools::DuplicateToolError;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration-related errors. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Two tools were registered under the same name.
    #[error("Registry error: {0}")]
    Registry(#[from] DuplicateToolError),

    /// Error originating from the transport layer.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// I/O errors from file operations or network communication.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal server errors that should not occur under normal operation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error comes from configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Registry(_))
    }
}
