//! STDIO transport implementation.
//!
//! Standard input/output transport for MCP - the default and recommended mode.
//! Logs go to stderr; stdout carries only JSON-RPC responses.

use tracing::info;

use super::TransportResult;
use super::lines::serve_session;
use crate::core::{McpServer, Shutdown};

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport until stdin closes or shutdown fires.
    pub async fn run(server: McpServer, shutdown: Shutdown) -> TransportResult<()> {
        info!("Ready - communicating via stdin/stdout");

        serve_session(&server, tokio::io::stdin(), tokio::io::stdout(), &shutdown).await?;

        info!("STDIO transport finished");
        Ok(())
    }
}
