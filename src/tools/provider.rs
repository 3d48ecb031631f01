//! Tool Provider trait
//!
//! Unified interface between the stdio transport and the tools it exposes.
//! `YtdlpProvider` is the only implementation today.

use super::ToolDefinition;
use anyhow::Result;
use async_trait::async_trait;

/// Unified interface for tool providers
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;

    /// Returns the list of tools this provider offers
    fn tools(&self) -> Vec<ToolDefinition>;

    /// Check if this provider can handle the given tool
    fn can_handle(&self, tool_name: &str) -> bool;

    /// Execute a tool with JSON-encoded arguments and return its text output
    async fn execute(&self, tool_name: &str, arguments: &str) -> Result<String>;
}
