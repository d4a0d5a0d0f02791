//! Request dispatch (handshake, tool listing, tool calls).

use serde_json::Value;
use tracing::{debug, warn};

use crate::handler::ToolHandler;
use crate::protocol::{
    CallToolParams, InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, LATEST_PROTOCOL_VERSION, ListToolsResult, SUPPORTED_PROTOCOL_VERSIONS,
    ServerCapabilities, ServerInfo, ToolsCapability,
};

/// Identity reported to clients during the handshake.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub instructions: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "resend-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            instructions: None,
        }
    }
}

/// Transport-independent MCP server.
///
/// Turns one decoded request into at most one response. Holds no
/// per-connection state, so a single instance can be shared by every
/// session of every transport.
pub struct Server<H> {
    config: ServerConfig,
    handler: H,
}

impl<H: ToolHandler> Server<H> {
    pub fn new(config: ServerConfig, handler: H) -> Self {
        Self { config, handler }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Handle one request. Notifications yield `None`.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            let error = JsonRpcError::invalid_request(format!(
                "unsupported jsonrpc version {:?}",
                request.jsonrpc
            ));
            return request.id.map(|id| JsonRpcResponse::failure(Some(id), error));
        }

        let Some(id) = request.id else {
            debug!(method = %request.method, "Received notification");
            return None;
        };

        let outcome = match request.method.as_str() {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(Value::Object(Default::default())),
            "tools/list" => to_value(ListToolsResult {
                tools: self.handler.tools(),
            }),
            "tools/call" => self.call_tool(request.params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(Some(id), result),
            Err(error) => JsonRpcResponse::failure(Some(id), error),
        })
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = parse_params(params)?;
        let protocol_version = negotiate_version(&params.protocol_version);

        debug!(
            client = params.client_info.as_ref().map(|c| c.name.as_str()).unwrap_or("unknown"),
            requested = %params.protocol_version,
            negotiated = %protocol_version,
            "Initializing session"
        );

        to_value(InitializeResult {
            protocol_version: protocol_version.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            server_info: ServerInfo {
                name: self.config.name.clone(),
                version: self.config.version.clone(),
            },
            instructions: self.config.instructions.clone(),
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = parse_params(params)?;
        debug!(tool = %params.name, "Calling tool");

        let result = self
            .handler
            .call(&params.name, params.arguments)
            .await
            .inspect_err(|e| warn!(tool = %params.name, error = %e, "Tool call rejected"))?;

        if result.is_error {
            warn!(tool = %params.name, "Tool reported failure");
        }

        to_value(result)
    }
}

fn negotiate_version(requested: &str) -> &str {
    SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .copied()
        .find(|v| *v == requested)
        .unwrap_or(LATEST_PROTOCOL_VERSION)
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(|e| JsonRpcError::invalid_params(format!("invalid params: {e}")))
}

fn to_value(result: impl serde::Serialize) -> Result<Value, JsonRpcError> {
    serde_json::to_value(result).map_err(|e| JsonRpcError::internal(e.to_string()))
}
