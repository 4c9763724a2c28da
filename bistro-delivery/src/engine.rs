use crate::clock::{Clock, SystemClock};
use crate::models::{DeliveryCalculation, Destination, PickupEstimate};
use crate::policy::{DeliveryPolicy, RushTable};
use bistro_catalog::{distance_km, DeliveryZone, GeoZoneCatalog};
use bistro_core::{GeocodeError, Geocoder};
use bistro_shared::{Coordinate, Restaurant};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Resolves the delivery zone for a destination and prices the trip.
/// Stateless apart from shared read-only config; safe to share across sessions.
pub struct DeliveryEligibilityEngine {
    catalog: Arc<GeoZoneCatalog>,
    geocoder: Option<Arc<dyn Geocoder>>,
    clock: Arc<dyn Clock>,
    policy: DeliveryPolicy,
    rush: RushTable,
}

impl DeliveryEligibilityEngine {
    pub fn new(catalog: Arc<GeoZoneCatalog>, policy: DeliveryPolicy) -> Self {
        let rush = RushTable::from_windows(&policy.rush_windows);
        Self {
            catalog,
            geocoder: None,
            clock: Arc::new(SystemClock),
            policy,
            rush,
        }
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn catalog(&self) -> &GeoZoneCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> &DeliveryPolicy {
        &self.policy
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Quote delivery to `destination` at the current local hour.
    /// Geocoding trouble never fails the quote: the restaurant location stands in.
    pub async fn calculate(
        &self,
        destination: &Destination,
        restaurant: &Restaurant,
        order_amount: Decimal,
    ) -> DeliveryCalculation {
        let (point, validated) = self.resolve_destination(destination, restaurant).await;
        let mut calculation = self.quote_at(point, restaurant, order_amount, self.clock.local_hour());
        calculation.address_validated = validated;
        calculation
    }

    /// Pure quote for a resolved point at a given hour of day
    pub fn quote_at(
        &self,
        destination: Coordinate,
        restaurant: &Restaurant,
        order_amount: Decimal,
        hour: u32,
    ) -> DeliveryCalculation {
        let zones = self.catalog.snapshot();
        let distance = distance_km(restaurant.location, destination);

        // Both the destination and the restaurant must sit inside the zone's radius
        let zone = zones
            .covering(destination)
            .find(|zone| distance <= zone.radius_km)
            .cloned();

        let Some(zone) = zone else {
            debug!(
                restaurant = %restaurant.name,
                destination = %destination,
                "No delivery zone covers destination"
            );
            return DeliveryCalculation::unavailable(true);
        };

        let fee = self.fee_for(&zone, distance, order_amount);
        let eta_minutes = self.eta_for(&zone, distance, restaurant.delivery_time_minutes, hour);

        debug!(
            zone = %zone.name,
            distance_km = distance,
            %fee,
            eta_minutes,
            "Delivery quoted"
        );

        DeliveryCalculation {
            is_available: true,
            is_free_delivery: fee.is_zero(),
            fee,
            eta_minutes,
            zone: Some(zone),
            distance_km: distance,
            reason: None,
            address_validated: true,
        }
    }

    pub fn fee_for(&self, zone: &DeliveryZone, distance_km: f64, order_amount: Decimal) -> Decimal {
        if order_amount >= zone.free_delivery_threshold {
            return Decimal::ZERO;
        }

        let extra_km = (distance_km - self.policy.free_radius_km).max(0.0);
        let extra_km = Decimal::from_f64(extra_km).unwrap_or(Decimal::ZERO);

        (zone.base_fee + extra_km * self.policy.per_km_surcharge).round_dp(2)
    }

    pub fn eta_for(&self, zone: &DeliveryZone, distance_km: f64, baseline_minutes: u32, hour: u32) -> u32 {
        let travel = distance_km * self.policy.minutes_per_km;
        let raw = (baseline_minutes as f64 + travel) * self.rush.multiplier(hour);
        let minutes = raw.round().max(0.0) as u32;
        minutes.min(zone.max_delivery_minutes)
    }

    pub fn pickup_estimate(&self) -> PickupEstimate {
        PickupEstimate {
            min_minutes: self.policy.pickup_min_minutes,
            max_minutes: self.policy.pickup_max_minutes,
        }
    }

    /// Coordinates for the quote plus whether they came from the customer's input
    async fn resolve_destination(&self, destination: &Destination, restaurant: &Restaurant) -> (Coordinate, bool) {
        let text = match destination {
            Destination::Point { coordinate } => return (*coordinate, true),
            Destination::Address { coordinate: Some(coordinate), .. } => return (*coordinate, true),
            Destination::Address { text, coordinate: None } => text,
        };

        match self.geocode(text).await {
            Ok(point) => (point, true),
            Err(e) => {
                warn!(
                    restaurant = %restaurant.name,
                    "Could not geocode delivery address, using restaurant location: {}", e
                );
                (restaurant.location, false)
            }
        }
    }

    async fn geocode(&self, text: &str) -> Result<Coordinate, GeocodeError> {
        let geocoder = self
            .geocoder
            .as_ref()
            .ok_or_else(|| GeocodeError::Provider("no geocoder configured".to_string()))?;

        let timeout_ms = self.policy.geocode_timeout_ms;
        tokio::time::timeout(Duration::from_millis(timeout_ms), geocoder.geocode(text))
            .await
            .map_err(|_| GeocodeError::Timeout(timeout_ms))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::UNAVAILABLE_REASON;
    use async_trait::async_trait;
    use bistro_catalog::distance::EARTH_RADIUS_KM;
    use bistro_core::StaticGeocoder;
    use bistro_shared::Brand;

    const QUIET_HOUR: u32 = 3;

    fn north(km: f64) -> Coordinate {
        Coordinate::new((km / EARTH_RADIUS_KM).to_degrees(), 0.0)
    }

    fn restaurant_at_origin() -> Restaurant {
        Restaurant::new("Byk Origin", Coordinate::new(0.0, 0.0), Brand::new("THE BYK"), 30, "Origin st. 1")
    }

    fn five_km_zone() -> DeliveryZone {
        DeliveryZone::new("Hub", Coordinate::new(0.0, 0.0), 5.0, Decimal::from(200), Decimal::from(1500), 45)
    }

    fn engine_with(zones: Vec<DeliveryZone>, hour: u32) -> DeliveryEligibilityEngine {
        let catalog = Arc::new(GeoZoneCatalog::new(zones).unwrap());
        DeliveryEligibilityEngine::new(catalog, DeliveryPolicy::default())
            .with_clock(Arc::new(FixedClock::at_hour(hour)))
    }

    #[test]
    fn test_fee_with_distance_surcharge() {
        let engine = engine_with(vec![five_km_zone()], QUIET_HOUR);
        let calc = engine.quote_at(north(4.0), &restaurant_at_origin(), Decimal::from(1000), QUIET_HOUR);

        assert!(calc.is_available);
        assert_eq!(calc.fee, Decimal::from(250));
        assert!(!calc.is_free_delivery);
        assert!((calc.distance_km - 4.0).abs() < 1e-6);
        assert_eq!(calc.zone.as_ref().map(|z| z.name.as_str()), Some("Hub"));
        assert_eq!(calc.reason, None);
    }

    #[test]
    fn test_free_delivery_over_threshold() {
        let engine = engine_with(vec![five_km_zone()], QUIET_HOUR);
        let calc = engine.quote_at(north(4.0), &restaurant_at_origin(), Decimal::from(1600), QUIET_HOUR);

        assert!(calc.is_available);
        assert_eq!(calc.fee, Decimal::ZERO);
        assert!(calc.is_free_delivery);
        assert_eq!(calc.chargeable_fee(), Decimal::ZERO);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let engine = engine_with(vec![five_km_zone()], QUIET_HOUR);
        let calc = engine.quote_at(north(1.0), &restaurant_at_origin(), Decimal::from(1500), QUIET_HOUR);
        assert!(calc.is_free_delivery);
    }

    #[test]
    fn test_within_free_radius_pays_base_fee_only() {
        let engine = engine_with(vec![five_km_zone()], QUIET_HOUR);
        let calc = engine.quote_at(north(2.0), &restaurant_at_origin(), Decimal::from(100), QUIET_HOUR);
        assert_eq!(calc.fee, Decimal::from(200));
    }

    #[test]
    fn test_out_of_range_is_unavailable() {
        let engine = engine_with(vec![five_km_zone()], QUIET_HOUR);
        let calc = engine.quote_at(north(20.0), &restaurant_at_origin(), Decimal::from(1000), QUIET_HOUR);

        assert!(!calc.is_available);
        assert_eq!(calc.fee, Decimal::ZERO);
        assert_eq!(calc.eta_minutes, 0);
        assert!(calc.zone.is_none());
        assert_eq!(calc.reason.as_deref(), Some(UNAVAILABLE_REASON));
    }

    #[test]
    fn test_restaurant_must_also_be_inside_zone() {
        // Zone centred 4 km north covers the destination, but the restaurant
        // is 6 km from the destination, beyond the 5 km radius.
        let zone = DeliveryZone::new("North hub", north(4.0), 5.0, Decimal::from(200), Decimal::from(1500), 45);
        let engine = engine_with(vec![zone], QUIET_HOUR);

        let calc = engine.quote_at(north(6.0), &restaurant_at_origin(), Decimal::from(1000), QUIET_HOUR);
        assert!(!calc.is_available);

        let calc = engine.quote_at(north(4.5), &restaurant_at_origin(), Decimal::from(1000), QUIET_HOUR);
        assert!(calc.is_available);
    }

    #[test]
    fn test_tightest_zone_wins() {
        let wide = DeliveryZone::new("Wide", Coordinate::new(0.0, 0.0), 15.0, Decimal::from(300), Decimal::from(2000), 60);
        let engine = engine_with(vec![wide, five_km_zone()], QUIET_HOUR);

        let near = engine.quote_at(north(4.0), &restaurant_at_origin(), Decimal::from(100), QUIET_HOUR);
        assert_eq!(near.zone.map(|z| z.name), Some("Hub".to_string()));

        let far = engine.quote_at(north(10.0), &restaurant_at_origin(), Decimal::from(100), QUIET_HOUR);
        assert_eq!(far.zone.map(|z| z.name), Some("Wide".to_string()));
        // 300 + (10 - 3) * 50
        assert_eq!(far.fee, Decimal::from(650));
    }

    #[test]
    fn test_eta_applies_rush_multiplier_and_clamps() {
        let engine = engine_with(vec![five_km_zone()], QUIET_HOUR);
        let restaurant = restaurant_at_origin();

        // (30 + 4 * 2.5) * 1.0
        let quiet = engine.quote_at(north(4.0), &restaurant, Decimal::from(100), QUIET_HOUR);
        assert_eq!(quiet.eta_minutes, 40);

        // (30 + 10) * 1.1 = 44
        let shoulder = engine.quote_at(north(4.0), &restaurant, Decimal::from(100), 16);
        assert_eq!(shoulder.eta_minutes, 44);

        // (30 + 10) * 1.3 = 52, clamped to the zone's 45
        let peak = engine.quote_at(north(4.0), &restaurant, Decimal::from(100), 13);
        assert_eq!(peak.eta_minutes, 45);
    }

    #[test]
    fn test_eta_never_exceeds_zone_maximum() {
        let engine = engine_with(vec![five_km_zone()], QUIET_HOUR);
        let mut slow_kitchen = restaurant_at_origin();
        slow_kitchen.delivery_time_minutes = 240;

        for hour in 0..24 {
            let calc = engine.quote_at(north(1.0), &slow_kitchen, Decimal::from(100), hour);
            assert!(calc.eta_minutes <= 45);
        }
    }

    #[tokio::test]
    async fn test_calculate_is_idempotent() {
        let engine = engine_with(vec![five_km_zone()], 19);
        let restaurant = restaurant_at_origin();
        let destination = Destination::point(north(3.5));

        let first = engine.calculate(&destination, &restaurant, Decimal::from(900)).await;
        let second = engine.calculate(&destination, &restaurant, Decimal::from(900)).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_address_is_geocoded() {
        let geocoder = StaticGeocoder::new().with_address("Hub lane 4", north(4.0));
        let engine = engine_with(vec![five_km_zone()], QUIET_HOUR).with_geocoder(Arc::new(geocoder));

        let calc = engine
            .calculate(&Destination::address("hub lane 4"), &restaurant_at_origin(), Decimal::from(1000))
            .await;
        assert!(calc.address_validated);
        assert_eq!(calc.fee, Decimal::from(250));
    }

    #[tokio::test]
    async fn test_picked_coordinate_skips_geocoding() {
        let engine = engine_with(vec![five_km_zone()], QUIET_HOUR);
        let destination = Destination::Address {
            text: "somewhere unknown".to_string(),
            coordinate: Some(north(4.0)),
        };

        let calc = engine.calculate(&destination, &restaurant_at_origin(), Decimal::from(1000)).await;
        assert!(calc.address_validated);
        assert_eq!(calc.fee, Decimal::from(250));
    }

    #[tokio::test]
    async fn test_unknown_address_falls_back_to_restaurant() {
        let engine = engine_with(vec![five_km_zone()], QUIET_HOUR).with_geocoder(Arc::new(StaticGeocoder::new()));

        let calc = engine
            .calculate(&Destination::address("Nowhere 1"), &restaurant_at_origin(), Decimal::from(1000))
            .await;
        assert!(!calc.address_validated);
        assert!(calc.is_available);
        assert_eq!(calc.distance_km, 0.0);
        assert_eq!(calc.fee, Decimal::from(200));
    }

    struct StuckGeocoder;

    #[async_trait]
    impl Geocoder for StuckGeocoder {
        async fn geocode(&self, _address: &str) -> Result<Coordinate, GeocodeError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Coordinate::new(10.0, 10.0))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_geocoding_timeout_falls_back() {
        let engine = engine_with(vec![five_km_zone()], QUIET_HOUR).with_geocoder(Arc::new(StuckGeocoder));

        let calc = engine
            .calculate(&Destination::address("Slow st. 1"), &restaurant_at_origin(), Decimal::from(1000))
            .await;
        assert!(!calc.address_validated);
        assert!(calc.is_available);
    }

    #[test]
    fn test_pickup_window() {
        let engine = engine_with(vec![five_km_zone()], QUIET_HOUR);
        assert_eq!(engine.pickup_estimate(), PickupEstimate { min_minutes: 15, max_minutes: 30 });
    }
}
