pub mod distance;
pub mod zone;
pub mod catalog;

pub use distance::distance_km;
pub use zone::{default_zones, DeliveryZone};
pub use catalog::{CatalogError, GeoZoneCatalog, ZoneSet};
