//! Shared state for the HTTP transport.

use std::sync::Arc;
use std::time::Duration;

use mcp::{Server, ToolHandler};
use policy::OriginPolicy;

use crate::session::SessionRegistry;

/// Interval between keep-alive comments on idle event streams.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Everything the request handlers share.
pub struct AppState<H> {
    pub server: Arc<Server<H>>,
    pub sessions: SessionRegistry,
    pub policy: OriginPolicy,
    pub keep_alive: Duration,
}

impl<H: ToolHandler> AppState<H> {
    pub fn new(server: Server<H>, policy: OriginPolicy) -> Self {
        Self {
            server: Arc::new(server),
            sessions: SessionRegistry::new(),
            policy,
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }

    /// Keep-alives also surface dead connections, so tests shorten this.
    pub fn with_keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = interval;
        self
    }
}
