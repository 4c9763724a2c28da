use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use bistro_catalog::DeliveryZone;
use bistro_delivery::{DeliveryCalculation, Destination, PickupEstimate};
use bistro_shared::{Coordinate, Restaurant};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub restaurant_id: Uuid,
    pub destination: Destination,
    #[serde(default)]
    pub order_amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub calculation: DeliveryCalculation,
    pub pickup: PickupEstimate,
}

#[derive(Debug, Deserialize)]
pub struct ZoneQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/delivery/quote", post(quote))
        .route("/v1/zones", get(list_zones))
        .route("/v1/restaurants", get(list_restaurants))
        .route("/v1/restaurants/{id}/zones", get(restaurant_zones))
}

/// POST /v1/delivery/quote
/// Stateless quote, no session needed
pub async fn quote(State(state): State<AppState>, Json(req): Json<QuoteRequest>) -> Result<Json<QuoteResponse>, AppError> {
    let restaurant = state.menu.get_restaurant(req.restaurant_id).await?;
    let calculation = state
        .engine
        .calculate(&req.destination, &restaurant, req.order_amount)
        .await;

    Ok(Json(QuoteResponse {
        calculation,
        pickup: state.engine.pickup_estimate(),
    }))
}

/// GET /v1/zones?lat=..&lon=..
pub async fn list_zones(
    State(state): State<AppState>,
    Query(query): Query<ZoneQuery>,
) -> Result<Json<Vec<DeliveryZone>>, AppError> {
    let zones = match (query.lat, query.lon) {
        (Some(lat), Some(lon)) => {
            let point = Coordinate::new(lat, lon);
            if !point.is_valid() {
                return Err(AppError::Validation(format!("invalid coordinate {}", point)));
            }
            state.engine.catalog().zones_covering(point)
        }
        (None, None) => state.engine.catalog().all(),
        _ => return Err(AppError::Validation("lat and lon go together".to_string())),
    };
    Ok(Json(zones))
}

/// GET /v1/restaurants
/// Pickup points and delivery origins, by name
pub async fn list_restaurants(State(state): State<AppState>) -> Result<Json<Vec<Restaurant>>, AppError> {
    Ok(Json(state.menu.list_restaurants().await?))
}

/// GET /v1/restaurants/:id/zones
pub async fn restaurant_zones(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DeliveryZone>>, AppError> {
    let restaurant = state.menu.get_restaurant(id).await?;
    Ok(Json(state.engine.catalog().zones_serving(restaurant.location)))
}
