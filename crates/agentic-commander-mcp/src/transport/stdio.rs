//! Stdio transport — reads JSON-RPC from stdin, writes to stdout.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::protocol::ProtocolHandler;
use crate::types::{McpError, McpResult, RequestId};

use super::framing;

/// Stdio transport for desktop MCP clients.
///
/// Messages are handled one at a time, in arrival order, so responses are
/// written in request order.
pub struct StdioTransport {
    handler: Arc<ProtocolHandler>,
}

impl StdioTransport {
    pub fn new(handler: Arc<ProtocolHandler>) -> Self {
        Self { handler }
    }

    /// Run the transport loop — reads from stdin, writes to stdout.
    pub async fn run(&self) -> McpResult<()> {
        self.run_with(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Run the loop over arbitrary streams until the reader hits EOF.
    pub async fn run_with<R, W>(&self, reader: R, mut writer: W) -> McpResult<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        tracing::info!("Stdio transport started");

        loop {
            buf.clear();
            let bytes_read = reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(McpError::Io)?;

            if bytes_read == 0 {
                tracing::info!("EOF on stdin, shutting down");
                break;
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    self.handler.handle_raw(trimmed).await
                }
                Err(e) => {
                    tracing::debug!("Rejected non UTF-8 line: {e}");
                    let error = McpError::ParseError(format!("invalid UTF-8: {e}"))
                        .to_json_rpc_error(RequestId::Null);
                    Some(serde_json::to_value(error)?)
                }
            };

            if let Some(response) = response {
                let framed = framing::frame_message(&response)?;
                writer
                    .write_all(framed.as_bytes())
                    .await
                    .map_err(McpError::Io)?;
                writer.flush().await.map_err(McpError::Io)?;
            }
        }

        Ok(())
    }
}
