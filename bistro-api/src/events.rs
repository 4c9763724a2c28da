use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use bistro_shared::models::events::SessionEvent;
use futures_util::{Stream, StreamExt};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;
use crate::error::AppError;
use crate::sessions::session;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/sessions/{id}/events", get(stream_events))
}

/// GET /v1/sessions/:id/events
/// Cart and checkout events as server-sent events. Lagged receivers skip what they missed.
pub async fn stream_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let rx = {
        let session = session(&state, id).await?;
        let session = session.lock().await;
        let rx = session.subscribe();
        rx
    };

    let stream = BroadcastStream::new(rx).filter_map(move |result| async move {
        match result {
            Ok(event) => {
                let name = match &event {
                    SessionEvent::Cart(_) => "cart",
                    SessionEvent::Checkout(_) => "checkout",
                };
                Event::default().event(name).json_data(&event).ok().map(Ok)
            }
            Err(e) => {
                tracing::debug!(session_id = %id, "Event stream lagged: {}", e);
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
