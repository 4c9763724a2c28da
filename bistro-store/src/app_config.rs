use bistro_catalog::{default_zones, CatalogError, DeliveryZone, GeoZoneCatalog};
use bistro_core::{InMemoryMenu, StaticGeocoder};
use bistro_delivery::DeliveryPolicy;
use bistro_shared::{Coordinate, Dish, Restaurant};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub delivery: DeliveryPolicy,
    /// Empty means the built-in zone set
    #[serde(default)]
    pub zones: Vec<DeliveryZone>,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub menu: MenuConfig,
    #[serde(default)]
    pub orders: OrdersConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_idle_ttl")]
    pub idle_ttl_seconds: u64,
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_idle_ttl() -> u64 { 3600 }
fn default_event_buffer() -> usize { 100 }

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_seconds: default_idle_ttl(),
            event_buffer: default_event_buffer(),
        }
    }
}

/// Local order sink
#[derive(Debug, Deserialize, Clone)]
pub struct OrdersConfig {
    /// Oldest accepted orders are dropped past this many
    #[serde(default = "default_retained_orders")]
    pub retained: usize,
}

fn default_retained_orders() -> usize { 1000 }

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            retained: default_retained_orders(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct GeocodingConfig {
    #[serde(default)]
    pub addresses: Vec<AddressEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AddressEntry {
    pub address: String,
    pub coordinate: Coordinate,
}

/// Reference data served by the local menu repository
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MenuConfig {
    #[serde(default)]
    pub restaurants: Vec<Restaurant>,
    #[serde(default)]
    pub dishes: Vec<Dish>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `BISTRO_SERVER__PORT=8081`
            .add_source(config::Environment::with_prefix("BISTRO").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_toml(source: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn zone_catalog(&self) -> Result<GeoZoneCatalog, CatalogError> {
        if self.zones.is_empty() {
            GeoZoneCatalog::new(default_zones())
        } else {
            GeoZoneCatalog::new(self.zones.clone())
        }
    }

    pub fn geocoder(&self) -> StaticGeocoder {
        self.geocoding
            .addresses
            .iter()
            .fold(StaticGeocoder::new(), |geocoder, entry| {
                geocoder.with_address(&entry.address, entry.coordinate)
            })
    }

    pub fn menu(&self) -> InMemoryMenu {
        InMemoryMenu::new(self.menu.restaurants.clone(), self.menu.dishes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml("[server]\nport = 8080\n").unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.delivery, DeliveryPolicy::default());
        assert_eq!(config.session.idle_ttl_seconds, 3600);
        assert_eq!(config.orders.retained, 1000);
        assert_eq!(config.zone_catalog().unwrap().all().len(), default_zones().len());
        assert!(config.geocoder().is_empty());
    }

    #[test]
    fn test_zones_and_policy_overrides() {
        let source = r#"
            [server]
            port = 9000

            [delivery]
            per_km_surcharge = 40
            geocode_timeout_ms = 1500

            [orders]
            retained = 50

            [[zones]]
            name = "Test Hub"
            radius_km = 6.0
            base_fee = 180
            free_delivery_threshold = 1400
            max_delivery_minutes = 40
            center = { latitude = 55.75, longitude = 37.61 }

            [[geocoding.addresses]]
            address = "Tverskaya 15"
            coordinate = { latitude = 55.7652, longitude = 37.6050 }
        "#;
        let config = Config::from_toml(source).unwrap();

        assert_eq!(config.delivery.per_km_surcharge, Decimal::from(40));
        assert_eq!(config.delivery.geocode_timeout_ms, 1500);
        assert_eq!(config.delivery.free_radius_km, 3.0);
        assert_eq!(config.orders.retained, 50);

        let zones = config.zone_catalog().unwrap().all();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].name, "Test Hub");
        assert!(zones[0].is_active);

        assert_eq!(config.geocoder().len(), 1);
    }

    #[test]
    fn test_invalid_zone_is_reported() {
        let source = r#"
            [server]
            port = 9000

            [[zones]]
            name = "Broken"
            radius_km = -2.0
            base_fee = 180
            free_delivery_threshold = 1400
            max_delivery_minutes = 40
            center = { latitude = 55.75, longitude = 37.61 }
        "#;
        let config = Config::from_toml(source).unwrap();
        assert!(config.zone_catalog().is_err());
    }
}
