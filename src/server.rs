//! Line-delimited JSON transport
//!
//! Each input line is a [`ToolCall`]; each call produces exactly one
//! [`ToolResponse`] line on the output. Blank lines are ignored.

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::tools::{ToolCall, ToolProvider, ToolResponse};

/// Run one request line through `provider`
pub async fn handle_line(provider: &dyn ToolProvider, line: &str) -> ToolResponse {
    let call: ToolCall = match serde_json::from_str(line) {
        Ok(call) => call,
        Err(e) => {
            warn!(error = %e, "Malformed tool call");
            return ToolResponse {
                name: String::new(),
                content: format!("Invalid request: {e}"),
                is_error: true,
            };
        }
    };

    if !provider.can_handle(&call.name) {
        return ToolResponse {
            content: format!("Unknown tool: {}", call.name),
            name: call.name,
            is_error: true,
        };
    }

    let arguments = if call.arguments.is_null() {
        "{}".to_string()
    } else {
        call.arguments.to_string()
    };

    info!(tool = %call.name, provider = provider.name(), "Tool call received");
    match provider.execute(&call.name, &arguments).await {
        Ok(content) => ToolResponse {
            name: call.name,
            content,
            is_error: false,
        },
        Err(e) => {
            warn!(tool = %call.name, error = %e, "Tool call failed");
            ToolResponse {
                name: call.name,
                content: format!("{e:#}"),
                is_error: true,
            }
        }
    }
}

/// Serve tool calls from `reader` until end of input
///
/// # Errors
///
/// Returns an error if reading input or writing a response fails.
pub async fn serve<R, W>(provider: &dyn ToolProvider, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(provider, &line).await;
        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
    }
    debug!("Input closed");
    Ok(())
}
