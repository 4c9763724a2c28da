use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};
use bistro_order::CheckoutSession;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions", post(create_session))
        .route("/v1/sessions/{id}", delete(close_session))
}

/// Locked per-session state; callers hold the guard for the whole request
pub async fn session(state: &AppState, id: Uuid) -> Result<Arc<Mutex<CheckoutSession>>, AppError> {
    state.sessions.get(&id).ok_or_else(|| AppError::session_not_found(id))
}

/// POST /v1/sessions
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionResponse>) {
    let session_id = state.sessions.insert(CheckoutSession::new(state.event_buffer));
    tracing::info!(%session_id, "Session opened");
    (StatusCode::CREATED, Json(SessionResponse { session_id }))
}

/// DELETE /v1/sessions/:id
pub async fn close_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    if state.sessions.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::session_not_found(id))
    }
}
