//! Line-delimited JSON-RPC sessions.
//!
//! One message per line in, one response line out, in receipt order. Used by
//! the STDIO and TCP transports over any async byte stream.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, instrument, warn};

use super::TransportResult;
use super::protocol::{self, JsonRpcResponse};
use crate::core::{McpServer, Shutdown};

/// Serve one session until EOF or shutdown.
///
/// Malformed lines are answered with an invalid-argument failure and the
/// session carries on. Once shutdown fires no further line is read.
#[instrument(skip_all)]
pub async fn serve_session<R, W>(
    server: &McpServer,
    reader: R,
    mut writer: W,
    shutdown: &Shutdown,
) -> TransportResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = tokio::select! {
            biased;
            _ = shutdown.wait() => {
                info!("Shutdown requested, closing session");
                break;
            }
            read = reader.read_until(b'\n', &mut buf) => read?,
        };

        if read == 0 {
            info!("Client closed the session");
            break;
        }

        // Invalid UTF-8 is answered like malformed JSON.
        let response = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                debug!(len = line.len(), "Received line");

                match protocol::decode(line) {
                    Ok(request) => {
                        protocol::process_until_shutdown(server, request, shutdown).await
                    }
                    Err(malformed) => Some(malformed),
                }
            }
            Err(e) => {
                warn!("Line is not valid UTF-8: {}", e);
                Some(JsonRpcResponse::malformed(None, e))
            }
        };

        if let Some(response) = response {
            write_response(&mut writer, &response).await?;
        }
    }

    writer.flush().await?;
    Ok(())
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> TransportResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut bytes = serde_json::to_vec(response)?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}
