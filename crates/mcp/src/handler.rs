//! Tool handler trait.

use crate::ToolError;
use crate::protocol::{CallToolResult, Tool};
use serde_json::Value;
use std::future::Future;

/// Trait for the tool set a [`Server`](crate::Server) exposes.
///
/// Implementations declare their tools and execute calls. This is the
/// boundary between protocol plumbing and side effects.
pub trait ToolHandler: Send + Sync {
    /// Get the declared tools.
    fn tools(&self) -> Vec<Tool>;

    /// Execute a tool call.
    ///
    /// Returns `Err` when the call is rejected before running (unknown tool,
    /// bad arguments). Failures of the work itself come back as a result
    /// with `is_error` set.
    fn call(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> impl Future<Output = Result<CallToolResult, ToolError>> + Send;
}
