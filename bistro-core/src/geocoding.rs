use async_trait::async_trait;
use bistro_shared::Coordinate;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeocodeError {
    #[error("Address not found: {0}")]
    NotFound(String),

    #[error("Geocoding timed out after {0} ms")]
    Timeout(u64),

    #[error("Geocoding provider failed: {0}")]
    Provider(String),
}

/// Address text -> coordinate
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError>;
}

/// Coordinate -> address text, used for "detect my location"
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse_geocode(&self, point: Coordinate) -> Result<String, GeocodeError>;
}

/// Fixed address book. Lookups ignore case and surrounding whitespace.
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    entries: HashMap<String, (String, Coordinate)>,
}

/// Reverse lookups match entries within this many degrees on both axes
const REVERSE_TOLERANCE_DEG: f64 = 0.001;

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: &str, point: Coordinate) -> Self {
        self.insert(address, point);
        self
    }

    pub fn insert(&mut self, address: &str, point: Coordinate) {
        self.entries
            .insert(Self::normalize(address), (address.trim().to_string(), point));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn normalize(address: &str) -> String {
        address.trim().to_lowercase()
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        match self.entries.get(&Self::normalize(address)) {
            Some((_, point)) => Ok(*point),
            None => {
                debug!(known = self.entries.len(), "Address not in address book");
                Err(GeocodeError::NotFound(address.to_string()))
            }
        }
    }
}

#[async_trait]
impl ReverseGeocoder for StaticGeocoder {
    async fn reverse_geocode(&self, point: Coordinate) -> Result<String, GeocodeError> {
        self.entries
            .values()
            .filter(|(_, p)| {
                (p.latitude - point.latitude).abs() <= REVERSE_TOLERANCE_DEG
                    && (p.longitude - point.longitude).abs() <= REVERSE_TOLERANCE_DEG
            })
            .min_by(|(_, a), (_, b)| {
                let da = (a.latitude - point.latitude).powi(2) + (a.longitude - point.longitude).powi(2);
                let db = (b.latitude - point.latitude).powi(2) + (b.longitude - point.longitude).powi(2);
                da.total_cmp(&db)
            })
            .map(|(address, _)| address.clone())
            .ok_or_else(|| GeocodeError::NotFound(point.to_string()))
    }
}
