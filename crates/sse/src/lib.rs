//! Streaming HTTP transport for the MCP server.
//!
//! Many clients, each owning one long-lived event stream and posting
//! requests against it.
//!
//! # Endpoints
//!
//! - `GET /sse` - open a session; the first event (`endpoint`) carries the
//!   session id, also sent as the `Mcp-Session-Id` response header
//! - `POST /message` - one JSON-RPC message for the session named by the
//!   `Mcp-Session-Id` header; answered `202`, the JSON-RPC response arrives
//!   on the session's stream
//! - `OPTIONS *` - CORS preflight
//!
//! # Request pipeline
//!
//! ```text
//! request
//!    │
//!    ▼
//! ┌──────────────┐   403
//! │ origin guard │ ─────► rejected (no CORS, no session state touched)
//! └──────┬───────┘
//!        ▼
//! ┌──────────────┐   200
//! │     CORS     │ ─────► OPTIONS preflight
//! └──────┬───────┘
//!        ▼
//! ┌──────────────┐        ┌──────────────────┐     ┌────────────┐
//! │    routes    │ ─────► │ session registry │ ──► │ dispatcher │ ──► event stream
//! └──────────────┘        └──────────────────┘     └────────────┘
//! ```

mod cors;
mod error;
mod routes;
mod session;
mod state;
mod stream;

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use mcp::ToolHandler;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use cors::{ALLOW_HEADERS, ALLOW_METHODS, EXPOSE_HEADERS};
pub use error::{Error, ErrorResponse, Result};
pub use routes::{MCP_SESSION_ID, MESSAGE_PATH, SSE_PATH};
pub use session::{DeliveryError, SessionGuard, SessionId, SessionRegistry};
pub use state::{AppState, DEFAULT_KEEP_ALIVE};
pub use stream::EventStream;

/// Create the router with all routes and middleware configured.
pub fn create_router<H: ToolHandler + 'static>(state: Arc<AppState<H>>) -> Router {
    let policy = state.policy.clone();

    Router::new()
        .route(
            SSE_PATH,
            get(routes::open_stream::<H>).fallback(routes::not_found),
        )
        .route(
            MESSAGE_PATH,
            post(routes::post_message::<H>).fallback(routes::not_found),
        )
        .fallback(routes::not_found)
        // Layers run bottom-up: trace, then the guard, then CORS.
        .layer(middleware::from_fn_with_state(policy.clone(), cors::cors))
        .layer(middleware::from_fn_with_state(policy, cors::origin_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the listening socket.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .map_err(|source| Error::Bind {
            addr: format!("{host}:{port}"),
            source,
        })
}

/// Serve until `shutdown` resolves, then close every session so the open
/// streams end and the server can drain.
pub async fn serve<H, F>(listener: TcpListener, state: Arc<AppState<H>>, shutdown: F) -> Result<()>
where
    H: ToolHandler + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let sessions = state.sessions.clone();
    let router = create_router(state);

    info!(addr = %listener.local_addr()?, "Serving MCP over HTTP");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Shutting down HTTP transport");
            sessions.close_all();
        })
        .await?;

    Ok(())
}
