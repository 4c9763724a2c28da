use bistro_core::{DeliveryMethod, PaymentMethod};
use bistro_delivery::{DeliveryCalculation, PickupEstimate};
use bistro_shared::{Brand, Coordinate, Dish, Masked, Restaurant};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::cart::CartError;

/// One dish in the cart, remembering the restaurant it was picked from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub dish: Dish,
    pub restaurant: Restaurant,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.dish.price * Decimal::from(self.quantity)
    }
}

/// Display row, see `CartStore::grouped_items`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartGroupedItem {
    pub dish: Dish,
    pub restaurant_id: Uuid,
    pub quantity: u32,
    pub line_total: Decimal,
}

impl From<&CartLine> for CartGroupedItem {
    fn from(line: &CartLine) -> Self {
        Self {
            dish: line.dish.clone(),
            restaurant_id: line.restaurant.id,
            quantity: line.quantity,
            line_total: line.line_total(),
        }
    }
}

/// An add that would mix brands, parked until the customer decides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAdd {
    pub dish: Dish,
    pub restaurant: Restaurant,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddOutcome {
    Added {
        dish_id: Uuid,
        quantity: u32,
    },
    ConflictPending {
        pending: PendingAdd,
        current_brand: Brand,
    },
    Rejected {
        error: CartError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartSnapshot {
    pub brand: Option<Brand>,
    pub restaurant_id: Option<Uuid>,
    pub items: Vec<CartGroupedItem>,
    pub total_items: u32,
    pub total: Decimal,
    pub pending: Option<PendingAdd>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckoutStep {
    AddressOrMethod,
    Payment,
    Confirmation,
    Submitted,
    Cancelled,
}

impl CheckoutStep {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutStep::Submitted | CheckoutStep::Cancelled)
    }
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CheckoutStep::AddressOrMethod => "ADDRESS_OR_METHOD",
            CheckoutStep::Payment => "PAYMENT",
            CheckoutStep::Confirmation => "CONFIRMATION",
            CheckoutStep::Submitted => "SUBMITTED",
            CheckoutStep::Cancelled => "CANCELLED",
        };
        f.write_str(name)
    }
}

/// Tip amounts offered as one-tap buttons
pub const TIP_PRESETS: [u32; 5] = [0, 50, 100, 150, 200];

/// Largest custom tip accepted
pub const MAX_TIP: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TipChoice {
    Preset(u32),
    /// Free-form entry as typed by the customer
    Custom(String),
}

/// In-progress order. Lives only while checkout runs.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDraft {
    pub delivery_method: DeliveryMethod,
    pub payment_method: PaymentMethod,
    pub recipient_name: String,
    pub recipient_phone: Masked<String>,
    pub address: String,
    pub coordinate: Option<Coordinate>,
    pub tip: Decimal,
    pub special_requests: String,
    pub selected_time: DateTime<Utc>,
    pub last_calculation: Option<DeliveryCalculation>,
}

impl OrderDraft {
    /// Defaults: delivery, card, scheduled one hour from `now`
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            delivery_method: DeliveryMethod::Delivery,
            payment_method: PaymentMethod::Card,
            recipient_name: String::new(),
            recipient_phone: Masked(String::new()),
            address: String::new(),
            coordinate: None,
            tip: Decimal::ZERO,
            special_requests: String::new(),
            selected_time: now + chrono::Duration::hours(1),
            last_calculation: None,
        }
    }

    pub fn has_destination(&self) -> bool {
        !self.address.trim().is_empty() || self.coordinate.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentDetail {
    Delivery {
        address: String,
        coordinate: Option<Coordinate>,
        calculation: Option<DeliveryCalculation>,
    },
    Pickup {
        restaurant_address: String,
        window: PickupEstimate,
    },
}

/// Confirmation view, rebuilt from current cart and draft every time it is asked for
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutSummary {
    pub step: CheckoutStep,
    pub items: Vec<CartGroupedItem>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub is_free_delivery: bool,
    pub tip: Decimal,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub fulfillment: FulfillmentDetail,
    pub eta_minutes: Option<u32>,
    pub selected_time: DateTime<Utc>,
    pub special_requests: Option<String>,
}
