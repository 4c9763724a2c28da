use async_trait::async_trait;
use bistro_shared::{Brand, Coordinate, Masked};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryMethod {
    #[default]
    Delivery,
    Pickup,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Card,
    Cash,
    Online,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionItem {
    pub dish_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// Finalized checkout handed to the order-creation API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSubmission {
    pub restaurant_id: Uuid,
    pub brand: Brand,
    pub items: Vec<SubmissionItem>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub tip: Decimal,
    pub total: Decimal,
    pub delivery_method: DeliveryMethod,
    pub payment_method: PaymentMethod,
    pub recipient_name: String,
    pub recipient_phone: Masked<String>,
    /// Delivery address, or the restaurant's own address for pickup
    pub address: String,
    pub coordinate: Option<Coordinate>,
    pub eta_minutes: Option<u32>,
    pub scheduled_for: DateTime<Utc>,
    pub special_requests: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmittedOrder {
    pub order_id: Uuid,
    pub order_number: String,
    pub total: Decimal,
    pub accepted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmissionError {
    #[error("Order rejected by validation: {0}")]
    Validation(String),

    #[error("Order service unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait OrderSubmitter: Send + Sync {
    /// Create the order. Callers surface failures to the user; nothing here retries.
    async fn submit(&self, order: &OrderSubmission) -> Result<SubmittedOrder, SubmissionError>;
}
