use arc_swap::ArcSwap;
use bistro_shared::Coordinate;
use std::sync::Arc;
use tracing::info;
use crate::zone::{default_zones, DeliveryZone};

/// Immutable zone list, ascending by radius so the tightest zone comes first
#[derive(Debug, Clone, Default)]
pub struct ZoneSet {
    zones: Vec<DeliveryZone>,
}

impl ZoneSet {
    fn new(mut zones: Vec<DeliveryZone>) -> Self {
        // stable: equal radii keep their configured order
        zones.sort_by(|a, b| a.radius_km.total_cmp(&b.radius_km));
        Self { zones }
    }

    /// Active zones whose radius contains the point
    pub fn covering(&self, point: Coordinate) -> impl Iterator<Item = &DeliveryZone> + '_ {
        self.zones
            .iter()
            .filter(move |zone| zone.is_active && zone.contains(point))
    }

    pub fn zones(&self) -> &[DeliveryZone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// Delivery zones, fully loaded before serving queries.
/// Reloads swap the whole set at once; readers holding a snapshot keep it.
pub struct GeoZoneCatalog {
    zones: ArcSwap<ZoneSet>,
}

impl GeoZoneCatalog {
    pub fn new(zones: Vec<DeliveryZone>) -> Result<Self, CatalogError> {
        Self::validate_all(&zones)?;
        Ok(Self {
            zones: ArcSwap::from_pointee(ZoneSet::new(zones)),
        })
    }

    pub fn with_default_zones() -> Self {
        Self {
            zones: ArcSwap::from_pointee(ZoneSet::new(default_zones())),
        }
    }

    /// Current zone set. Use one snapshot per calculation.
    pub fn snapshot(&self) -> Arc<ZoneSet> {
        self.zones.load_full()
    }

    /// Replace every zone. Nothing is swapped if any zone is invalid.
    pub fn reload(&self, zones: Vec<DeliveryZone>) -> Result<usize, CatalogError> {
        Self::validate_all(&zones)?;
        let count = zones.len();
        self.zones.store(Arc::new(ZoneSet::new(zones)));
        info!("Delivery zone catalog reloaded with {} zones", count);
        Ok(count)
    }

    pub fn zones_covering(&self, point: Coordinate) -> Vec<DeliveryZone> {
        self.snapshot().covering(point).cloned().collect()
    }

    /// Active zones a restaurant at this location sits inside
    pub fn zones_serving(&self, restaurant_location: Coordinate) -> Vec<DeliveryZone> {
        self.zones_covering(restaurant_location)
    }

    pub fn all(&self) -> Vec<DeliveryZone> {
        self.snapshot().zones().to_vec()
    }

    fn validate_all(zones: &[DeliveryZone]) -> Result<(), CatalogError> {
        zones.iter().try_for_each(DeliveryZone::validate)
    }
}

impl Default for GeoZoneCatalog {
    fn default() -> Self {
        Self::with_default_zones()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Invalid delivery zone {zone}: {reason}")]
    InvalidZone {
        zone: String,
        reason: String,
    },
}
