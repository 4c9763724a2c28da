pub mod cart;
pub mod checkout;
pub mod models;
pub mod session;
pub mod submission;

pub use cart::{CartError, CartStore, MAX_QUANTITY};
pub use checkout::{CheckoutError, CheckoutOrchestrator};
pub use models::{
    AddOutcome, CartGroupedItem, CartSnapshot, CheckoutStep, CheckoutSummary, FulfillmentDetail, OrderDraft,
    PendingAdd, TipChoice, MAX_TIP, TIP_PRESETS,
};
pub use session::{CheckoutSession, SessionRegistry};
pub use submission::{InMemoryOrderSubmitter, DEFAULT_RETAINED_ORDERS};
