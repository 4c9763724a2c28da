use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Json, Router,
};
use bistro_order::{AddOutcome, CartSnapshot, CheckoutSession};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::error::AppError;
use crate::sessions::session;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub dish_id: Uuid,
    pub restaurant_id: Uuid,
    #[serde(default = "one")]
    pub quantity: u32,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub delta: i32,
}

#[derive(Debug, Serialize)]
pub struct AddItemResponse {
    pub outcome: AddOutcome,
    pub cart: CartSnapshot,
}

#[derive(Debug, Serialize)]
pub struct QuantityResponse {
    pub quantity: u32,
    pub cart: CartSnapshot,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions/{id}/cart", get(get_cart).delete(clear_cart))
        .route("/v1/sessions/{id}/cart/items", post(add_item))
        .route(
            "/v1/sessions/{id}/cart/items/{dish_id}",
            patch(update_quantity).delete(remove_item),
        )
        .route("/v1/sessions/{id}/cart/conflict/confirm", post(confirm_replace))
        .route("/v1/sessions/{id}/cart/conflict/cancel", post(cancel_replace))
}

/// Rejections become errors; a brand conflict is an ordinary answer the client must act on
fn settle(outcome: AddOutcome, session: &CheckoutSession) -> Result<Json<AddItemResponse>, AppError> {
    if let AddOutcome::Rejected { error } = outcome {
        return Err(error.into());
    }
    Ok(Json(AddItemResponse {
        outcome,
        cart: session.cart().snapshot(),
    }))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/sessions/:id/cart
pub async fn get_cart(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<CartSnapshot>, AppError> {
    let session = session(&state, id).await?;
    let session = session.lock().await;
    Ok(Json(session.cart().snapshot()))
}

/// POST /v1/sessions/:id/cart/items
pub async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<AddItemResponse>, AppError> {
    let session = session(&state, id).await?;
    let mut session = session.lock().await;

    let outcome = session
        .add_from_menu(state.menu.as_ref(), req.dish_id, req.restaurant_id, req.quantity)
        .await;
    if matches!(outcome, AddOutcome::Added { .. }) {
        session.sync_checkout().await?;
    }
    settle(outcome, &session)
}

/// PATCH /v1/sessions/:id/cart/items/:dish_id
pub async fn update_quantity(
    State(state): State<AppState>,
    Path((id, dish_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<QuantityResponse>, AppError> {
    let session = session(&state, id).await?;
    let mut session = session.lock().await;

    let quantity = session.cart_mut().update_quantity(dish_id, req.delta)?;
    session.sync_checkout().await?;
    Ok(Json(QuantityResponse {
        quantity,
        cart: session.cart().snapshot(),
    }))
}

/// DELETE /v1/sessions/:id/cart/items/:dish_id
pub async fn remove_item(
    State(state): State<AppState>,
    Path((id, dish_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CartSnapshot>, AppError> {
    let session = session(&state, id).await?;
    let mut session = session.lock().await;

    session.cart_mut().remove(dish_id);
    session.sync_checkout().await?;
    Ok(Json(session.cart().snapshot()))
}

/// DELETE /v1/sessions/:id/cart
pub async fn clear_cart(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<CartSnapshot>, AppError> {
    let session = session(&state, id).await?;
    let mut session = session.lock().await;

    session.cart_mut().clear();
    Ok(Json(session.cart().snapshot()))
}

/// POST /v1/sessions/:id/cart/conflict/confirm
pub async fn confirm_replace(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AddItemResponse>, AppError> {
    let session = session(&state, id).await?;
    let mut session = session.lock().await;

    let outcome = session.cart_mut().confirm_replace()?;
    session.sync_checkout().await?;
    settle(outcome, &session)
}

/// POST /v1/sessions/:id/cart/conflict/cancel
pub async fn cancel_replace(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<CartSnapshot>, AppError> {
    let session = session(&state, id).await?;
    let mut session = session.lock().await;

    session.cart_mut().cancel_replace();
    Ok(Json(session.cart().snapshot()))
}
