use crate::cart::{CartError, CartStore};
use crate::checkout::{CheckoutError, CheckoutOrchestrator};
use crate::models::AddOutcome;
use bistro_core::{MenuRepository, OrderSubmitter, SubmittedOrder};
use bistro_delivery::DeliveryEligibilityEngine;
use bistro_shared::models::events::SessionEvent;
use bistro_store::SessionStore;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

pub type SessionRegistry = SessionStore<CheckoutSession>;

/// One customer's cart plus, once started, their checkout.
/// Both publish onto the same event channel.
pub struct CheckoutSession {
    cart: CartStore,
    checkout: Option<CheckoutOrchestrator>,
    events: broadcast::Sender<SessionEvent>,
}

impl CheckoutSession {
    pub fn new(event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self {
            cart: CartStore::new().with_events(events.clone()),
            checkout: None,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut CartStore {
        &mut self.cart
    }

    pub fn checkout(&self) -> Option<&CheckoutOrchestrator> {
        self.checkout.as_ref()
    }

    /// Look the dish and restaurant up, then add. Unknown ids are rejections, not errors.
    pub async fn add_from_menu(
        &mut self,
        menu: &dyn MenuRepository,
        dish_id: Uuid,
        restaurant_id: Uuid,
        quantity: u32,
    ) -> AddOutcome {
        let dish = match menu.get_dish(dish_id).await {
            Ok(dish) => dish,
            Err(e) => {
                debug!(%dish_id, "Dish lookup failed: {}", e);
                return AddOutcome::Rejected { error: CartError::DishNotFound(dish_id) };
            }
        };
        let restaurant = match menu.get_restaurant(restaurant_id).await {
            Ok(restaurant) => restaurant,
            Err(e) => {
                debug!(%restaurant_id, "Restaurant lookup failed: {}", e);
                return AddOutcome::Rejected { error: CartError::RestaurantNotFound(restaurant_id) };
            }
        };
        self.cart.add(dish, restaurant, quantity)
    }

    /// Begin checkout, replacing any earlier finished or abandoned one
    pub fn start_checkout(
        &mut self,
        engine: Arc<DeliveryEligibilityEngine>,
    ) -> Result<&mut CheckoutOrchestrator, CheckoutError> {
        let checkout = CheckoutOrchestrator::start(&self.cart, engine)?.with_events(self.events.clone());
        Ok(self.checkout.insert(checkout))
    }

    /// Cart and checkout together, for calls that read one and change the other
    pub fn checkout_parts(&mut self) -> Result<(&CartStore, &mut CheckoutOrchestrator), CheckoutError> {
        let checkout = self.checkout.as_mut().ok_or(CheckoutError::NotStarted)?;
        Ok((&self.cart, checkout))
    }

    /// Re-quote an open delivery checkout after the cart changed
    pub async fn sync_checkout(&mut self) -> Result<(), CheckoutError> {
        let Some(checkout) = self.checkout.as_mut() else {
            return Ok(());
        };
        if checkout.step().is_terminal() || self.cart.is_empty() {
            return Ok(());
        }
        checkout.refresh_delivery(&self.cart).await?;
        Ok(())
    }

    /// Submit and, once the order is accepted, empty the cart
    pub async fn submit(&mut self, submitter: &dyn OrderSubmitter) -> Result<SubmittedOrder, CheckoutError> {
        let (cart, checkout) = self.checkout_parts()?;
        let accepted = checkout.submit(cart, submitter).await?;
        self.cart.clear();
        Ok(accepted)
    }
}
