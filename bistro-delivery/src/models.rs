use bistro_catalog::DeliveryZone;
use bistro_shared::Coordinate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const UNAVAILABLE_REASON: &str = "delivery unavailable in this area";

/// Where the order should go: a map-picked point or typed address text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Destination {
    Point {
        coordinate: Coordinate,
    },
    Address {
        text: String,
        #[serde(default)]
        coordinate: Option<Coordinate>,
    },
}

impl Destination {
    pub fn point(coordinate: Coordinate) -> Self {
        Destination::Point { coordinate }
    }

    pub fn address(text: impl Into<String>) -> Self {
        Destination::Address { text: text.into(), coordinate: None }
    }
}

/// Result of one delivery quote. Never mutated; the next quote replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryCalculation {
    pub is_available: bool,
    pub fee: Decimal,
    pub eta_minutes: u32,
    pub zone: Option<DeliveryZone>,
    pub distance_km: f64,
    pub is_free_delivery: bool,
    pub reason: Option<String>,
    /// False when address text could not be geocoded and the restaurant location stood in
    pub address_validated: bool,
}

impl DeliveryCalculation {
    pub fn unavailable(address_validated: bool) -> Self {
        Self {
            is_available: false,
            fee: Decimal::ZERO,
            eta_minutes: 0,
            zone: None,
            distance_km: 0.0,
            is_free_delivery: false,
            reason: Some(UNAVAILABLE_REASON.to_string()),
            address_validated,
        }
    }

    /// Fee that actually lands on the bill
    pub fn chargeable_fee(&self) -> Decimal {
        if self.is_available && !self.is_free_delivery {
            self.fee
        } else {
            Decimal::ZERO
        }
    }
}

/// Pickup is zone-independent: fixed window, never a fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupEstimate {
    pub min_minutes: u32,
    pub max_minutes: u32,
}
