//! Session registry.
//!
//! Maps each open event stream's id to the queue feeding its dispatcher.
//! A session is open exactly while it is registered; removal is the whole
//! teardown.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mcp::JsonRpcRequest;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};
use uuid::Uuid;

/// A unique identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Why a message could not be handed to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// Not registered (never issued, or already closed).
    #[error("session not found")]
    NotFound,
    /// Registered, but its dispatcher has gone away.
    #[error("session dispatcher stopped")]
    DispatcherGone,
}

/// In-memory registry of open sessions.
///
/// Cloning is cheap; all clones share one map. Every operation takes the
/// lock once and never awaits while holding it, so a lookup can never see
/// a half-removed session.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<SessionId, UnboundedSender<JsonRpcRequest>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, UnboundedSender<JsonRpcRequest>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new session fed through `inbound`.
    ///
    /// The session stays open until the returned guard is dropped.
    pub fn open(&self, inbound: UnboundedSender<JsonRpcRequest>) -> SessionGuard {
        let mut sessions = self.lock();
        loop {
            let id = SessionId::new();
            if let Entry::Vacant(slot) = sessions.entry(id) {
                slot.insert(inbound);
                info!(session_id = %id, open_sessions = sessions.len(), "Session opened");
                return SessionGuard {
                    id,
                    registry: self.clone(),
                };
            }
        }
    }

    /// Whether `id` is currently open.
    pub fn contains(&self, id: &SessionId) -> bool {
        self.lock().contains_key(id)
    }

    /// Queue `message` for the session's dispatcher.
    ///
    /// Lookup and enqueue happen under one lock, so a session closed
    /// concurrently is reported as [`DeliveryError::NotFound`] and never
    /// receives the message.
    pub fn deliver(&self, id: &SessionId, message: JsonRpcRequest) -> Result<(), DeliveryError> {
        let sessions = self.lock();
        let inbound = sessions.get(id).ok_or(DeliveryError::NotFound)?;
        inbound
            .send(message)
            .map_err(|_| DeliveryError::DispatcherGone)
    }

    /// Deregister `id`. Returns whether it was open.
    pub fn close(&self, id: &SessionId) -> bool {
        let mut sessions = self.lock();
        let removed = sessions.remove(id).is_some();
        if removed {
            info!(session_id = %id, open_sessions = sessions.len(), "Session closed");
        }
        removed
    }

    /// Deregister every session; their streams end once drained.
    pub fn close_all(&self) -> usize {
        let mut sessions = self.lock();
        let count = sessions.len();
        sessions.clear();
        info!(count, "Closed all sessions");
        count
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Keeps a session registered while alive.
///
/// Owned by the session's event stream, so however the stream ends
/// (client gone, write error, shutdown) the session is deregistered.
#[derive(Debug)]
pub struct SessionGuard {
    id: SessionId,
    registry: SessionRegistry,
}

impl SessionGuard {
    pub fn id(&self) -> SessionId {
        self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if !self.registry.close(&self.id) {
            debug!(session_id = %self.id, "Session already deregistered");
        }
    }
}
