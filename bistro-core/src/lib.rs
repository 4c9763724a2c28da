pub mod geocoding;
pub mod repository;
pub mod submission;

pub use geocoding::{GeocodeError, Geocoder, ReverseGeocoder, StaticGeocoder};
pub use repository::{InMemoryMenu, MenuRepository};
pub use submission::{DeliveryMethod, OrderSubmission, OrderSubmitter, PaymentMethod, SubmissionError, SubmittedOrder};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Dish not found: {0}")]
    DishNotFound(String),
    #[error("Restaurant not found: {0}")]
    RestaurantNotFound(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
