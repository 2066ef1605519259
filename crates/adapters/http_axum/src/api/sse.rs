//! Server-Sent Events (SSE) stream of published snapshots.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use growhub_app::ports::AuditLog;
use growhub_domain::snapshot::{StateSnapshot, StatusDocument};

use crate::state::AppState;

fn status_event(snapshot: &StateSnapshot) -> Option<Event> {
    match Event::default()
        .event("status")
        .json_data(StatusDocument::from(snapshot))
    {
        Ok(event) => Some(event),
        Err(err) => {
            tracing::warn!(%err, "failed to serialize snapshot for SSE stream");
            None
        }
    }
}

/// `GET /status/stream` — one `status` event per published snapshot.
///
/// Opens with the current state so clients need no separate `GET /status`.
/// The stream continues until the client disconnects or the bus is closed.
pub async fn stream<L>(
    State(state): State<AppState<L>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>
where
    L: AuditLog + Send + Sync + 'static,
{
    let receiver = state.snapshots.subscribe();
    let current = state.control.snapshot().await.ok();

    let initial = tokio_stream::iter(
        current
            .as_ref()
            .and_then(status_event)
            .map(Ok::<_, Infallible>),
    );
    let updates = BroadcastStream::new(receiver).filter_map(|result| match result {
        Ok(snapshot) => status_event(&snapshot).map(Ok::<_, Infallible>),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "SSE subscriber lagged, some snapshots were dropped");
            None
        }
    });

    Sse::new(initial.chain(updates)).keep_alive(KeepAlive::default())
}
