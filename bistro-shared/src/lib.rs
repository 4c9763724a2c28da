pub mod models;
pub mod pii;

pub use models::geo::Coordinate;
pub use models::menu::{Brand, Dish, Restaurant};
pub use pii::Masked;
