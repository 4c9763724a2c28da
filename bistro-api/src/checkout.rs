use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use bistro_core::{DeliveryMethod, PaymentMethod, SubmittedOrder};
use bistro_delivery::DeliveryCalculation;
use bistro_order::{CheckoutError, CheckoutSession, CheckoutStep, CheckoutSummary, OrderDraft, TipChoice};
use bistro_shared::Coordinate;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::error::AppError;
use crate::sessions::session;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MethodRequest {
    pub method: DeliveryMethod,
}

#[derive(Debug, Deserialize)]
pub struct AddressRequest {
    #[serde(default)]
    pub address: String,
    pub coordinate: Option<Coordinate>,
}

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub payment_method: PaymentMethod,
    pub special_requests: Option<String>,
    pub selected_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub step: CheckoutStep,
    pub draft: OrderDraft,
    pub summary: CheckoutSummary,
}

#[derive(Debug, Serialize)]
pub struct QuoteView {
    pub calculation: Option<DeliveryCalculation>,
    pub checkout: CheckoutView,
}

#[derive(Debug, Serialize)]
pub struct TipView {
    pub tip: Decimal,
    pub checkout: CheckoutView,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions/{id}/checkout", get(get_checkout).post(start_checkout))
        .route("/v1/sessions/{id}/checkout/method", post(select_method))
        .route("/v1/sessions/{id}/checkout/address", post(set_address))
        .route("/v1/sessions/{id}/checkout/contact", post(set_contact))
        .route("/v1/sessions/{id}/checkout/payment", post(set_payment))
        .route("/v1/sessions/{id}/checkout/tip", post(set_tip))
        .route("/v1/sessions/{id}/checkout/advance", post(advance))
        .route("/v1/sessions/{id}/checkout/back", post(back))
        .route("/v1/sessions/{id}/checkout/submit", post(submit))
        .route("/v1/sessions/{id}/checkout/cancel", post(cancel))
}

fn view(session: &CheckoutSession) -> Result<CheckoutView, AppError> {
    let checkout = session.checkout().ok_or(CheckoutError::NotStarted)?;
    Ok(CheckoutView {
        step: checkout.step(),
        draft: checkout.draft().clone(),
        summary: checkout.summary(session.cart())?,
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/sessions/:id/checkout
pub async fn start_checkout(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckoutView>, AppError> {
    let session = session(&state, id).await?;
    let mut session = session.lock().await;

    session.start_checkout(state.engine.clone())?;
    Ok(Json(view(&session)?))
}

/// GET /v1/sessions/:id/checkout
pub async fn get_checkout(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<CheckoutView>, AppError> {
    let session = session(&state, id).await?;
    let session = session.lock().await;
    Ok(Json(view(&session)?))
}

/// POST /v1/sessions/:id/checkout/method
pub async fn select_method(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<MethodRequest>,
) -> Result<Json<QuoteView>, AppError> {
    let session = session(&state, id).await?;
    let mut session = session.lock().await;

    let (cart, checkout) = session.checkout_parts()?;
    let calculation = checkout.select_method(req.method, cart).await?;
    Ok(Json(QuoteView {
        calculation,
        checkout: view(&session)?,
    }))
}

/// POST /v1/sessions/:id/checkout/address
/// A map pin without text is named through reverse geocoding when possible.
pub async fn set_address(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddressRequest>,
) -> Result<Json<QuoteView>, AppError> {
    let mut text = req.address.trim().to_string();
    if text.is_empty() {
        let Some(point) = req.coordinate else {
            return Err(AppError::Validation("address or coordinate is required".to_string()));
        };
        match state.reverse_geocoder.reverse_geocode(point).await {
            Ok(found) => text = found,
            Err(e) => tracing::debug!(%point, "Reverse geocoding failed: {}", e),
        }
    }

    let session = session(&state, id).await?;
    let mut session = session.lock().await;

    let (cart, checkout) = session.checkout_parts()?;
    let calculation = checkout.set_address(text, req.coordinate, cart).await?;
    Ok(Json(QuoteView {
        calculation,
        checkout: view(&session)?,
    }))
}

/// POST /v1/sessions/:id/checkout/contact
pub async fn set_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ContactRequest>,
) -> Result<Json<CheckoutView>, AppError> {
    let session = session(&state, id).await?;
    let mut session = session.lock().await;

    let (_, checkout) = session.checkout_parts()?;
    checkout.set_contact(req.name, req.phone)?;
    Ok(Json(view(&session)?))
}

/// POST /v1/sessions/:id/checkout/payment
pub async fn set_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<CheckoutView>, AppError> {
    let session = session(&state, id).await?;
    let mut session = session.lock().await;

    let (_, checkout) = session.checkout_parts()?;
    checkout.select_payment(req.payment_method)?;
    if let Some(text) = req.special_requests {
        checkout.set_special_requests(text)?;
    }
    if let Some(at) = req.selected_time {
        checkout.set_selected_time(at)?;
    }
    Ok(Json(view(&session)?))
}

/// POST /v1/sessions/:id/checkout/tip
pub async fn set_tip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(choice): Json<TipChoice>,
) -> Result<Json<TipView>, AppError> {
    let session = session(&state, id).await?;
    let mut session = session.lock().await;

    let (_, checkout) = session.checkout_parts()?;
    let tip = checkout.set_tip(choice)?;
    Ok(Json(TipView {
        tip,
        checkout: view(&session)?,
    }))
}

/// POST /v1/sessions/:id/checkout/advance
pub async fn advance(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<CheckoutView>, AppError> {
    let session = session(&state, id).await?;
    let mut session = session.lock().await;

    let (_, checkout) = session.checkout_parts()?;
    checkout.advance()?;
    Ok(Json(view(&session)?))
}

/// POST /v1/sessions/:id/checkout/back
pub async fn back(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<CheckoutView>, AppError> {
    let session = session(&state, id).await?;
    let mut session = session.lock().await;

    let (_, checkout) = session.checkout_parts()?;
    checkout.back()?;
    Ok(Json(view(&session)?))
}

/// POST /v1/sessions/:id/checkout/submit
pub async fn submit(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<SubmittedOrder>, AppError> {
    let session = session(&state, id).await?;
    let mut session = session.lock().await;

    let accepted = session.submit(state.submitter.as_ref()).await?;
    Ok(Json(accepted))
}

/// POST /v1/sessions/:id/checkout/cancel
pub async fn cancel(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<CheckoutView>, AppError> {
    let session = session(&state, id).await?;
    let mut session = session.lock().await;

    let (_, checkout) = session.checkout_parts()?;
    checkout.cancel()?;
    Ok(Json(view(&session)?))
}
