//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, StatusCode},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use mcp::{JsonRpcRequest, ToolHandler};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::error::ErrorResponse;
use crate::session::{DeliveryError, SessionId};
use crate::state::AppState;
use crate::stream::{EventStream, run_dispatcher};

pub const SSE_PATH: &str = "/sse";
pub const MESSAGE_PATH: &str = "/message";

/// Header carrying the session id on `POST /message` and on the stream.
pub const MCP_SESSION_ID: HeaderName = HeaderName::from_static("mcp-session-id");

/// Responses queued per session before the dispatcher waits on the client.
const OUTBOUND_BUFFER: usize = 32;

/// `GET /sse`: open a session and stream its responses.
pub async fn open_stream<H: ToolHandler + 'static>(
    State(state): State<Arc<AppState<H>>>,
) -> Response {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);

    let guard = state.sessions.open(inbound_tx);
    let id = guard.id();

    tokio::spawn(run_dispatcher(
        id,
        Arc::clone(&state.server),
        inbound_rx,
        outbound_tx,
    ));

    let endpoint = Event::default()
        .event("endpoint")
        .id(id.to_string())
        .data(MESSAGE_PATH);
    let stream = EventStream::new(endpoint, outbound_rx, guard);

    (
        [(MCP_SESSION_ID, id.to_string())],
        Sse::new(stream).keep_alive(KeepAlive::new().interval(state.keep_alive)),
    )
        .into_response()
}

/// `POST /message`: hand one JSON-RPC message to its session.
pub async fn post_message<H: ToolHandler + 'static>(
    State(state): State<Arc<AppState<H>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ErrorResponse> {
    let header = headers
        .get(&MCP_SESSION_ID)
        .ok_or_else(ErrorResponse::missing_session_id)?;

    // A value that is not even an id cannot name an open session.
    let id = header
        .to_str()
        .ok()
        .and_then(|v| v.parse::<SessionId>().ok())
        .ok_or_else(ErrorResponse::session_not_found)?;

    if !state.sessions.contains(&id) {
        return Err(ErrorResponse::session_not_found());
    }

    let request: JsonRpcRequest =
        serde_json::from_slice(&body).map_err(ErrorResponse::invalid_payload)?;
    debug!(session_id = %id, method = %request.method, "Received message");

    match state.sessions.deliver(&id, request) {
        Ok(()) => Ok((StatusCode::ACCEPTED, "Accepted").into_response()),
        Err(DeliveryError::NotFound) => Err(ErrorResponse::session_not_found()),
        Err(e @ DeliveryError::DispatcherGone) => {
            error!(session_id = %id, error = %e, "Failed to hand off message");
            Err(ErrorResponse::internal())
        }
    }
}

/// Any other method or path.
pub async fn not_found() -> ErrorResponse {
    ErrorResponse::not_found()
}
