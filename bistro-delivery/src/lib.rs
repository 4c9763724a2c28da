pub mod clock;
pub mod engine;
pub mod models;
pub mod policy;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::DeliveryEligibilityEngine;
pub use models::{DeliveryCalculation, Destination, PickupEstimate, UNAVAILABLE_REASON};
pub use policy::{DeliveryPolicy, RushTable, RushWindow};
