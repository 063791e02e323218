//! TCP transport implementation.
//!
//! Line-delimited JSON-RPC over a TCP socket. Clients are served one at a
//! time; a new connection is accepted once the previous session ends.

use tokio::net::TcpListener;
use tracing::{info, warn};

use super::lines::serve_session;
use super::{TransportError, TransportResult, config::TcpConfig};
use crate::core::{McpServer, Shutdown};

/// TCP transport handler.
pub struct TcpTransport {
    config: TcpConfig,
}

impl TcpTransport {
    /// Create a new TCP transport with the given config.
    pub fn new(config: TcpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Bind and run the TCP transport.
    pub async fn run(self, server: McpServer, shutdown: Shutdown) -> TransportResult<()> {
        let addr = self.address();

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!("Ready - listening on {} (JSON-RPC over TCP)", addr);

        Self::serve(listener, server, shutdown).await
    }

    /// Accept and serve sessions on `listener` until shutdown.
    pub async fn serve(
        listener: TcpListener,
        server: McpServer,
        shutdown: Shutdown,
    ) -> TransportResult<()> {
        loop {
            let accepted = tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                accepted = listener.accept() => accepted,
            };

            let (mut stream, peer_addr) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    // Small delay to avoid spinning on persistent errors
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                    continue;
                }
            };

            info!("Accepted connection from {}", peer_addr);

            // Set TCP_NODELAY to disable Nagle's algorithm
            if let Err(e) = stream.set_nodelay(true) {
                warn!("Failed to set TCP_NODELAY for {}: {}", peer_addr, e);
            }

            let (reader, writer) = stream.split();
            match serve_session(&server, reader, writer, &shutdown).await {
                Ok(()) => info!("Client {} disconnected cleanly", peer_addr),
                Err(e) => warn!("Error while serving client {}: {}", peer_addr, e),
            }
        }

        info!("TCP transport finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ServerConfig;
    use crate::core::context::tests::test_context;
    use crate::domains::tools::ToolRegistry;
    use std::sync::Arc;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn test_serves_sessions_sequentially() {
        let server = McpServer::new(
            ServerConfig::default(),
            Arc::new(test_context("http://127.0.0.1:9")),
            Arc::new(ToolRegistry::new()),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let handle = tokio::spawn(TcpTransport::serve(listener, server, shutdown.clone()));

        for id in 1..=2 {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            let request = format!("{{\"jsonrpc\":\"2.0\",\"id\":{id},\"method\":\"ping\"}}\n");
            stream.write_all(request.as_bytes()).await.unwrap();

            let (reader, _writer) = stream.split();
            let mut line = String::new();
            BufReader::new(reader).read_line(&mut line).await.unwrap();
            let response: serde_json::Value = serde_json::from_str(&line).unwrap();
            assert_eq!(response["id"], id);
        }

        shutdown.trigger();
        handle.await.unwrap().unwrap();
    }
}
