use bistro_shared::Coordinate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::catalog::CatalogError;
use crate::distance::distance_km;

/// Circular delivery coverage area with its own fee and timing policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryZone {
    pub name: String,
    pub center: Coordinate,
    pub radius_km: f64,
    pub base_fee: Decimal,
    /// Orders at or above this amount ship free
    pub free_delivery_threshold: Decimal,
    pub max_delivery_minutes: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool { true }

impl DeliveryZone {
    pub fn new(
        name: impl Into<String>,
        center: Coordinate,
        radius_km: f64,
        base_fee: Decimal,
        free_delivery_threshold: Decimal,
        max_delivery_minutes: u32,
    ) -> Self {
        Self {
            name: name.into(),
            center,
            radius_km,
            base_fee,
            free_delivery_threshold,
            max_delivery_minutes,
            is_active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Distance from the zone's own center is within the radius
    pub fn contains(&self, point: Coordinate) -> bool {
        distance_km(self.center, point) <= self.radius_km
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: &str| CatalogError::InvalidZone {
            zone: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if !self.center.is_valid() {
            return Err(invalid("center is not a valid coordinate"));
        }
        if !self.radius_km.is_finite() || self.radius_km <= 0.0 {
            return Err(invalid("radius must be positive"));
        }
        if self.base_fee.is_sign_negative() || self.free_delivery_threshold.is_sign_negative() {
            return Err(invalid("fees must not be negative"));
        }
        if self.max_delivery_minutes == 0 {
            return Err(invalid("max delivery time must be positive"));
        }
        Ok(())
    }
}

/// Zones served out of the box when configuration names none
pub fn default_zones() -> Vec<DeliveryZone> {
    let moscow = Coordinate::new(55.7558, 37.6173);
    vec![
        DeliveryZone::new("Moscow Centre", moscow, 5.0, Decimal::from(200), Decimal::from(1500), 45),
        DeliveryZone::new("Moscow", moscow, 15.0, Decimal::from(300), Decimal::from(2000), 60),
        DeliveryZone::new(
            "Saint Petersburg",
            Coordinate::new(59.9311, 30.3609),
            10.0,
            Decimal::from(250),
            Decimal::from(1800),
            50,
        ),
        DeliveryZone::new(
            "Kaluga",
            Coordinate::new(54.5293, 36.2754),
            8.0,
            Decimal::from(150),
            Decimal::from(1200),
            40,
        ),
        DeliveryZone::new(
            "Yerevan",
            Coordinate::new(40.1792, 44.4991),
            12.0,
            Decimal::from(300),
            Decimal::from(1500),
            55,
        ),
    ]
}
