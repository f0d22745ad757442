use super::McpServer;
use crate::error::BridgeError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

/// Newline-delimited JSON-RPC: one message per input line, one response per
/// output line. Returns when the input closes.
pub async fn serve<R, W>(server: &McpServer, reader: R, mut writer: W) -> Result<(), BridgeError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if let Some(response) = server.handle_message(message).await {
            let mut payload = serde_json::to_vec(&response)?;
            payload.push(b'\n');
            writer.write_all(&payload).await?;
            writer.flush().await?;
        }
    }
    Ok(())
}

/// Logs go to stderr; stdout carries protocol traffic only.
pub async fn run(server: McpServer) -> Result<(), BridgeError> {
    info!("MCP server running on stdio");
    serve(&server, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
    info!("MCP stdio input closed");
    Ok(())
}
