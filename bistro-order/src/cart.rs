use crate::models::{AddOutcome, CartGroupedItem, CartLine, CartSnapshot, PendingAdd};
use bistro_shared::models::events::{CartEvent, SessionEvent};
use bistro_shared::{Brand, Dish, Restaurant};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

/// Upper bound for a single line
pub const MAX_QUANTITY: u32 = 99;

#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "code", content = "detail", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartError {
    #[error("Dish not found: {0}")]
    DishNotFound(Uuid),
    #[error("Restaurant not found: {0}")]
    RestaurantNotFound(Uuid),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),
    #[error("Quantity {requested} exceeds the maximum of {max}")]
    MaxQuantityExceeded { requested: u32, max: u32 },
    #[error("Dish is currently unavailable: {0}")]
    DishUnavailable(String),
    #[error("Dish brand {dish} does not match restaurant brand {restaurant}")]
    BrandMismatch { dish: String, restaurant: String },
    #[error("No pending brand conflict")]
    NoPendingConflict,
}

/// Single-brand cart. Lines keep insertion order; display order comes from `grouped_items`.
#[derive(Debug, Default)]
pub struct CartStore {
    lines: Vec<CartLine>,
    pending: Option<PendingAdd>,
    events: Option<broadcast::Sender<SessionEvent>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish every mutation on `sender`
    pub fn with_events(mut self, sender: broadcast::Sender<SessionEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Add `quantity` of `dish` picked at `restaurant`.
    ///
    /// A dish from another brand is not added; it is parked as a pending conflict
    /// until `confirm_replace` or `cancel_replace`.
    pub fn add(&mut self, dish: Dish, restaurant: Restaurant, quantity: u32) -> AddOutcome {
        if let Err(error) = Self::check_add(&dish, &restaurant, quantity) {
            debug!(dish_id = %dish.id, %error, "Rejected cart add");
            return AddOutcome::Rejected { error };
        }

        if let Some(current) = self.current_brand() {
            if current != dish.brand {
                info!(current = %current, pending = %dish.brand, "Brand conflict, awaiting confirmation");
                self.publish(CartEvent::ConflictPending {
                    dish_id: dish.id,
                    current_brand: current.to_string(),
                    pending_brand: dish.brand.to_string(),
                });
                let pending = PendingAdd { dish, restaurant, quantity };
                self.pending = Some(pending.clone());
                return AddOutcome::ConflictPending { pending, current_brand: current };
            }
        }

        self.insert(dish, restaurant, quantity)
    }

    /// Empty the cart and apply the parked add
    pub fn confirm_replace(&mut self) -> Result<AddOutcome, CartError> {
        let pending = self.pending.take().ok_or(CartError::NoPendingConflict)?;
        self.lines.clear();
        self.publish(CartEvent::ConflictResolved { replaced: true });
        Ok(self.insert(pending.dish, pending.restaurant, pending.quantity))
    }

    /// Drop the parked add; existing lines stay as they are
    pub fn cancel_replace(&mut self) {
        if self.pending.take().is_some() {
            self.publish(CartEvent::ConflictResolved { replaced: false });
        }
    }

    /// Shift a line by `delta`. Reaching zero or below removes the line.
    pub fn update_quantity(&mut self, dish_id: Uuid, delta: i32) -> Result<u32, CartError> {
        let index = self
            .position(dish_id)
            .ok_or(CartError::DishNotFound(dish_id))?;

        let next = i64::from(self.lines[index].quantity) + i64::from(delta);
        if next > i64::from(MAX_QUANTITY) {
            return Err(CartError::MaxQuantityExceeded {
                requested: u32::try_from(next).unwrap_or(u32::MAX),
                max: MAX_QUANTITY,
            });
        }

        if next <= 0 {
            self.lines.remove(index);
            let total = self.total_amount();
            self.publish(CartEvent::ItemRemoved { dish_id, total });
            return Ok(0);
        }

        // bounded by MAX_QUANTITY above
        let quantity = next as u32;
        self.lines[index].quantity = quantity;
        let total = self.total_amount();
        self.publish(CartEvent::QuantityChanged { dish_id, quantity, total });
        Ok(quantity)
    }

    pub fn remove(&mut self, dish_id: Uuid) {
        if let Some(index) = self.position(dish_id) {
            self.lines.remove(index);
            let total = self.total_amount();
            self.publish(CartEvent::ItemRemoved { dish_id, total });
        }
    }

    pub fn clear(&mut self) {
        let had_lines = !self.lines.is_empty();
        self.lines.clear();
        self.pending = None;
        if had_lines {
            self.publish(CartEvent::Cleared);
        }
    }

    pub fn total_amount(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn total_items(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn quantity_of(&self, dish_id: Uuid) -> u32 {
        self.position(dish_id)
            .map(|i| self.lines[i].quantity)
            .unwrap_or(0)
    }

    /// Lines sorted by dish name, ties broken by dish id
    pub fn grouped_items(&self) -> Vec<CartGroupedItem> {
        let mut items: Vec<CartGroupedItem> = self.lines.iter().map(CartGroupedItem::from).collect();
        items.sort_by(|a, b| {
            a.dish
                .name
                .cmp(&b.dish.name)
                .then_with(|| a.dish.id.cmp(&b.dish.id))
        });
        items
    }

    pub fn current_brand(&self) -> Option<Brand> {
        self.lines.first().map(|l| l.dish.brand.clone())
    }

    /// Restaurant the order ships from: the one behind the oldest remaining line
    pub fn restaurant(&self) -> Option<&Restaurant> {
        self.lines.first().map(|l| &l.restaurant)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn needs_confirmation(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&PendingAdd> {
        self.pending.as_ref()
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            brand: self.current_brand(),
            restaurant_id: self.restaurant().map(|r| r.id),
            items: self.grouped_items(),
            total_items: self.total_items(),
            total: self.total_amount(),
            pending: self.pending.clone(),
        }
    }

    fn check_add(dish: &Dish, restaurant: &Restaurant, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(0));
        }
        if quantity > MAX_QUANTITY {
            return Err(CartError::MaxQuantityExceeded { requested: quantity, max: MAX_QUANTITY });
        }
        if !dish.is_available {
            return Err(CartError::DishUnavailable(dish.name.clone()));
        }
        if dish.brand != restaurant.brand {
            return Err(CartError::BrandMismatch {
                dish: dish.brand.to_string(),
                restaurant: restaurant.brand.to_string(),
            });
        }
        Ok(())
    }

    fn insert(&mut self, dish: Dish, restaurant: Restaurant, quantity: u32) -> AddOutcome {
        let dish_id = dish.id;
        let merged = match self.position(dish_id) {
            Some(index) => {
                let merged = self.lines[index].quantity + quantity;
                if merged > MAX_QUANTITY {
                    return AddOutcome::Rejected {
                        error: CartError::MaxQuantityExceeded { requested: merged, max: MAX_QUANTITY },
                    };
                }
                let line = &mut self.lines[index];
                line.quantity = merged;
                line.dish = dish;
                merged
            }
            None => {
                self.lines.push(CartLine { dish, restaurant, quantity });
                quantity
            }
        };

        let total = self.total_amount();
        debug!(%dish_id, quantity = merged, %total, "Cart line updated");
        self.publish(CartEvent::ItemAdded { dish_id, quantity: merged, total });
        AddOutcome::Added { dish_id, quantity: merged }
    }

    fn position(&self, dish_id: Uuid) -> Option<usize> {
        self.lines.iter().position(|l| l.dish.id == dish_id)
    }

    fn publish(&self, event: CartEvent) {
        if let Some(tx) = &self.events {
            // no subscribers is fine
            let _ = tx.send(event.into());
        }
    }
}
