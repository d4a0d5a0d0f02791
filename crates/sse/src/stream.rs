//! Per-session event stream and dispatcher task.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::response::sse::Event;
use mcp::{JsonRpcRequest, Server, ToolHandler};
use tokio::sync::mpsc::{Receiver, Sender, UnboundedReceiver};
use tokio_stream::Stream;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error};

use crate::session::{SessionGuard, SessionId};

/// Body of a `GET /sse` response.
///
/// Yields the `endpoint` event first, then every response the session's
/// dispatcher produces. Owns the [`SessionGuard`], so dropping the stream
/// closes the session.
pub struct EventStream {
    first: Option<Event>,
    events: ReceiverStream<Event>,
    _guard: SessionGuard,
}

impl EventStream {
    pub fn new(first: Event, events: Receiver<Event>, guard: SessionGuard) -> Self {
        Self {
            first: Some(first),
            events: ReceiverStream::new(events),
            _guard: guard,
        }
    }
}

impl Stream for EventStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(first) = self.first.take() {
            return Poll::Ready(Some(Ok(first)));
        }
        Pin::new(&mut self.events).poll_next(cx).map(|event| event.map(Ok))
    }
}

/// Dispatch a session's requests one at a time, in arrival order.
///
/// Ends when the session is deregistered (its queue closes) or its stream
/// is gone.
pub async fn run_dispatcher<H: ToolHandler>(
    id: SessionId,
    server: Arc<Server<H>>,
    mut inbound: UnboundedReceiver<JsonRpcRequest>,
    outbound: Sender<Event>,
) {
    while let Some(request) = inbound.recv().await {
        if outbound.is_closed() {
            break;
        }

        debug!(session_id = %id, method = %request.method, "Dispatching");
        let Some(response) = server.handle(request).await else {
            continue;
        };

        let event = match Event::default().event("message").json_data(&response) {
            Ok(event) => event,
            Err(e) => {
                error!(session_id = %id, error = %e, "Failed to encode response");
                continue;
            }
        };

        if outbound.send(event).await.is_err() {
            break;
        }
    }

    debug!(session_id = %id, "Dispatcher stopped");
}
