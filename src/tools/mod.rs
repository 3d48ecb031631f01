//! yt-dlp tools exposed to agents
//!
//! Contains the tool provider trait, the yt-dlp provider, and the comments pipeline.

pub mod comments;
pub mod provider;
pub mod subtitles;
pub mod ytdlp;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use url::Url;

pub use provider::ToolProvider;
pub use ytdlp::YtdlpProvider;

/// Tool definition advertised to the agent
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    /// Name of the tool
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON schema for tool parameters
    pub parameters: serde_json::Value,
}

/// A tool invocation read from the transport
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to run
    pub name: String,
    /// Arguments object; missing means no arguments
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Result of a tool invocation written back to the transport
#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse {
    pub name: String,
    pub content: String,
    pub is_error: bool,
}

/// Accept only absolute http(s) URLs with a host
///
/// # Errors
///
/// Returns an error describing why the URL was rejected.
pub fn validate_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| anyhow::anyhow!("Invalid URL '{raw}': {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("Unsupported URL scheme '{}' in {raw}", url.scheme());
    }
    if url.host_str().is_none_or(str::is_empty) {
        bail!("URL has no host: {raw}");
    }
    Ok(url)
}
