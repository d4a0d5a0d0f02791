//! MCP (Model Context Protocol) server library.
//!
//! This crate provides the protocol types, a transport-independent request
//! dispatcher and the stdio (pipe) transport.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{CallToolResult, Server, ServerConfig, Tool, ToolError, ToolHandler};
//! use serde_json::Value;
//!
//! struct Hello;
//!
//! impl ToolHandler for Hello {
//!     fn tools(&self) -> Vec<Tool> {
//!         vec![Tool {
//!             name: "hello".to_string(),
//!             description: Some("Say hello".to_string()),
//!             input_schema: serde_json::json!({"type": "object"}),
//!         }]
//!     }
//!
//!     async fn call(&self, name: &str, _: Option<Value>) -> Result<CallToolResult, ToolError> {
//!         match name {
//!             "hello" => Ok(CallToolResult::text("hello!")),
//!             other => Err(ToolError::NotFound(other.to_string())),
//!         }
//!     }
//! }
//!
//! # async fn example() -> mcp::Result<()> {
//! let server = Server::new(ServerConfig::default(), Hello);
//! mcp::serve_stdio(&server).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod handler;
mod protocol;
mod server;
mod stdio;

pub use error::{Error, Result, ToolError};
pub use handler::ToolHandler;
pub use protocol::{
    CallToolParams, CallToolResult, ClientInfo, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, LATEST_PROTOCOL_VERSION, ListToolsResult,
    RequestId, SUPPORTED_PROTOCOL_VERSIONS, ServerCapabilities, ServerInfo, Tool, ToolContent,
    ToolsCapability,
};
pub use server::{Server, ServerConfig};
pub use stdio::{MAX_MESSAGE_SIZE, serve, serve_stdio};
