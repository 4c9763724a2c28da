use uuid::Uuid;
use rust_decimal::Decimal;

/// Cart mutations, published for UI layers and the session event stream
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartEvent {
    ItemAdded {
        dish_id: Uuid,
        quantity: u32,
        total: Decimal,
    },
    QuantityChanged {
        dish_id: Uuid,
        quantity: u32,
        total: Decimal,
    },
    ItemRemoved {
        dish_id: Uuid,
        total: Decimal,
    },
    ConflictPending {
        dish_id: Uuid,
        current_brand: String,
        pending_brand: String,
    },
    ConflictResolved {
        replaced: bool,
    },
    Cleared,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckoutEvent {
    StepChanged {
        from: String,
        to: String,
    },
    DeliveryQuoted {
        is_available: bool,
        fee: Decimal,
        eta_minutes: u32,
    },
    Submitted {
        order_id: Uuid,
        order_number: String,
        total: Decimal,
        timestamp: i64,
    },
    Cancelled {
        timestamp: i64,
    },
}

/// Everything a session publishes, in one stream
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    Cart(CartEvent),
    Checkout(CheckoutEvent),
}

impl From<CartEvent> for SessionEvent {
    fn from(event: CartEvent) -> Self {
        SessionEvent::Cart(event)
    }
}

impl From<CheckoutEvent> for SessionEvent {
    fn from(event: CheckoutEvent) -> Self {
        SessionEvent::Checkout(event)
    }
}
