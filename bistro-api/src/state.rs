use bistro_core::{Geocoder, MenuRepository, OrderSubmitter, ReverseGeocoder};
use bistro_delivery::DeliveryEligibilityEngine;
use bistro_order::{InMemoryOrderSubmitter, SessionRegistry};
use bistro_store::Config;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    pub engine: Arc<DeliveryEligibilityEngine>,
    pub menu: Arc<dyn MenuRepository>,
    pub submitter: Arc<dyn OrderSubmitter>,
    pub reverse_geocoder: Arc<dyn ReverseGeocoder>,
    pub event_buffer: usize,
}

impl AppState {
    /// Wire the local, in-process collaborators described by `config`
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let catalog = config.zone_catalog()?;
        let geocoder = Arc::new(config.geocoder());

        let engine = DeliveryEligibilityEngine::new(Arc::new(catalog), config.delivery.clone())
            .with_geocoder(geocoder.clone() as Arc<dyn Geocoder>);

        Ok(Self {
            sessions: Arc::new(SessionRegistry::new(Duration::from_secs(config.session.idle_ttl_seconds))),
            engine: Arc::new(engine),
            menu: Arc::new(config.menu()),
            submitter: Arc::new(InMemoryOrderSubmitter::with_capacity(config.orders.retained)),
            reverse_geocoder: geocoder,
            event_buffer: config.session.event_buffer,
        })
    }
}
