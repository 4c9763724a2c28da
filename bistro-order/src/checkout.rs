use crate::cart::CartStore;
use crate::models::{CheckoutStep, CheckoutSummary, FulfillmentDetail, OrderDraft, TipChoice, MAX_TIP, TIP_PRESETS};
use bistro_core::submission::SubmissionItem;
use bistro_core::{DeliveryMethod, OrderSubmission, OrderSubmitter, PaymentMethod, SubmissionError, SubmittedOrder};
use bistro_delivery::{DeliveryCalculation, DeliveryEligibilityEngine, Destination};
use bistro_shared::models::events::{CheckoutEvent, SessionEvent};
use bistro_shared::{Coordinate, Masked, Restaurant};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckoutError {
    #[error("Action belongs to step {expected}, checkout is at {actual}")]
    WrongStep { expected: CheckoutStep, actual: CheckoutStep },

    #[error("Step incomplete, missing: {}", .0.join(", "))]
    StepIncomplete(Vec<String>),

    #[error("Delivery unavailable: {0}")]
    DeliveryUnavailable(String),

    #[error("Invalid tip: {0}")]
    InvalidTip(String),

    #[error("Order total is out of range")]
    AmountOverflow,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Checkout has not been started")]
    NotStarted,

    #[error("Confirmation is left by submit or cancel")]
    AwaitingSubmit,

    #[error("Checkout already finished: {0}")]
    Finished(CheckoutStep),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// Step-by-step checkout over a cart.
///
/// The cart itself is borrowed per call so that edits made while checking out
/// are always reflected in quotes and totals.
pub struct CheckoutOrchestrator {
    step: CheckoutStep,
    draft: OrderDraft,
    restaurant: Restaurant,
    engine: Arc<DeliveryEligibilityEngine>,
    events: Option<broadcast::Sender<SessionEvent>>,
    submitted: Option<SubmittedOrder>,
}

impl CheckoutOrchestrator {
    pub fn start(cart: &CartStore, engine: Arc<DeliveryEligibilityEngine>) -> Result<Self, CheckoutError> {
        let restaurant = cart.restaurant().cloned().ok_or(CheckoutError::EmptyCart)?;
        let draft = OrderDraft::new(engine.clock().now());

        info!(restaurant = %restaurant.name, total = %cart.total_amount(), "Checkout started");

        Ok(Self {
            step: CheckoutStep::AddressOrMethod,
            draft,
            restaurant,
            engine,
            events: None,
            submitted: None,
        })
    }

    pub fn with_events(mut self, sender: broadcast::Sender<SessionEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn draft(&self) -> &OrderDraft {
        &self.draft
    }

    pub fn restaurant(&self) -> &Restaurant {
        &self.restaurant
    }

    pub fn submitted(&self) -> Option<&SubmittedOrder> {
        self.submitted.as_ref()
    }

    // --- AddressOrMethod ---

    pub async fn select_method(
        &mut self,
        method: DeliveryMethod,
        cart: &CartStore,
    ) -> Result<Option<DeliveryCalculation>, CheckoutError> {
        self.expect_step(CheckoutStep::AddressOrMethod)?;
        self.draft.delivery_method = method;
        self.refresh_delivery(cart).await
    }

    /// Set the delivery address. A map-picked coordinate skips geocoding.
    pub async fn set_address(
        &mut self,
        text: impl Into<String>,
        coordinate: Option<Coordinate>,
        cart: &CartStore,
    ) -> Result<Option<DeliveryCalculation>, CheckoutError> {
        self.expect_step(CheckoutStep::AddressOrMethod)?;
        self.draft.address = text.into().trim().to_string();
        self.draft.coordinate = coordinate;
        self.refresh_delivery(cart).await
    }

    pub fn set_contact(&mut self, name: impl Into<String>, phone: impl Into<String>) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::AddressOrMethod)?;
        self.draft.recipient_name = name.into().trim().to_string();
        self.draft.recipient_phone = Masked(phone.into().trim().to_string());
        Ok(())
    }

    /// Re-quote delivery against the current cart. Pickup and a missing address clear the quote.
    pub async fn refresh_delivery(&mut self, cart: &CartStore) -> Result<Option<DeliveryCalculation>, CheckoutError> {
        self.ensure_open()?;
        if let Some(restaurant) = cart.restaurant() {
            self.restaurant = restaurant.clone();
        } else {
            return Err(CheckoutError::EmptyCart);
        }

        if self.draft.delivery_method == DeliveryMethod::Pickup || !self.draft.has_destination() {
            self.draft.last_calculation = None;
            return Ok(None);
        }

        let destination = match (self.draft.address.is_empty(), self.draft.coordinate) {
            (true, Some(coordinate)) => Destination::point(coordinate),
            (_, coordinate) => Destination::Address {
                text: self.draft.address.clone(),
                coordinate,
            },
        };

        let calculation = self
            .engine
            .calculate(&destination, &self.restaurant, cart.total_amount())
            .await;

        self.publish(CheckoutEvent::DeliveryQuoted {
            is_available: calculation.is_available,
            fee: calculation.fee,
            eta_minutes: calculation.eta_minutes,
        });
        self.draft.last_calculation = Some(calculation.clone());
        Ok(Some(calculation))
    }

    // --- Payment ---

    pub fn select_payment(&mut self, method: PaymentMethod) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Payment)?;
        self.draft.payment_method = method;
        Ok(())
    }

    pub fn set_tip(&mut self, choice: TipChoice) -> Result<Decimal, CheckoutError> {
        self.expect_step(CheckoutStep::Payment)?;
        let tip = match choice {
            TipChoice::Preset(amount) if TIP_PRESETS.contains(&amount) => Decimal::from(amount),
            TipChoice::Preset(amount) => {
                return Err(CheckoutError::InvalidTip(format!("{amount} is not a preset")));
            }
            TipChoice::Custom(raw) => {
                let amount = Decimal::from_str(raw.trim())
                    .map_err(|_| CheckoutError::InvalidTip(format!("'{raw}' is not a number")))?;
                if amount.is_sign_negative() && !amount.is_zero() {
                    return Err(CheckoutError::InvalidTip(format!("{amount} is negative")));
                }
                if amount > Decimal::from(MAX_TIP) {
                    return Err(CheckoutError::InvalidTip(format!("{amount} is above {MAX_TIP}")));
                }
                amount.round_dp(2)
            }
        };
        self.draft.tip = tip;
        Ok(tip)
    }

    pub fn set_special_requests(&mut self, text: impl Into<String>) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Payment)?;
        self.draft.special_requests = text.into();
        Ok(())
    }

    pub fn set_selected_time(&mut self, at: DateTime<Utc>) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Payment)?;
        self.draft.selected_time = at;
        Ok(())
    }

    // --- Navigation ---

    /// Move forward one step once the current one is complete
    pub fn advance(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.ensure_open()?;
        let next = match self.step {
            CheckoutStep::AddressOrMethod => {
                self.check_address_step()?;
                CheckoutStep::Payment
            }
            CheckoutStep::Payment => CheckoutStep::Confirmation,
            CheckoutStep::Confirmation => return Err(CheckoutError::AwaitingSubmit),
            terminal => return Err(CheckoutError::Finished(terminal)),
        };
        self.transition(next);
        Ok(next)
    }

    pub fn back(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.ensure_open()?;
        let previous = match self.step {
            CheckoutStep::Confirmation => CheckoutStep::Payment,
            _ => CheckoutStep::AddressOrMethod,
        };
        if previous != self.step {
            self.transition(previous);
        }
        Ok(previous)
    }

    /// Totals as they stand right now; the fee follows the current cart total.
    /// A quote taken for another restaurant than the cart's current one is not used.
    pub fn summary(&self, cart: &CartStore) -> Result<CheckoutSummary, CheckoutError> {
        let origin = self.origin(cart);
        let subtotal = cart.total_amount();

        let (delivery_fee, is_free_delivery, eta_minutes, fulfillment) = match self.draft.delivery_method {
            DeliveryMethod::Pickup => (
                Decimal::ZERO,
                false,
                None,
                FulfillmentDetail::Pickup {
                    restaurant_address: origin.address.clone(),
                    window: self.engine.pickup_estimate(),
                },
            ),
            DeliveryMethod::Delivery => {
                let calculation = self
                    .draft
                    .last_calculation
                    .clone()
                    .filter(|_| origin.id == self.restaurant.id);
                let (fee, free, eta) = match calculation.as_ref() {
                    Some(calc) if calc.is_available => {
                        let fee = calc
                            .zone
                            .as_ref()
                            .map(|zone| self.engine.fee_for(zone, calc.distance_km, subtotal))
                            .unwrap_or(calc.fee);
                        (fee, fee.is_zero(), Some(calc.eta_minutes))
                    }
                    _ => (Decimal::ZERO, false, None),
                };
                (
                    fee,
                    free,
                    eta,
                    FulfillmentDetail::Delivery {
                        address: self.draft.address.clone(),
                        coordinate: self.draft.coordinate,
                        calculation,
                    },
                )
            }
        };

        let total = subtotal
            .checked_add(delivery_fee)
            .and_then(|sum| sum.checked_add(self.draft.tip))
            .ok_or(CheckoutError::AmountOverflow)?;

        let special = self.draft.special_requests.trim();
        Ok(CheckoutSummary {
            step: self.step,
            items: cart.grouped_items(),
            subtotal,
            delivery_fee,
            is_free_delivery,
            tip: self.draft.tip,
            total,
            payment_method: self.draft.payment_method,
            fulfillment,
            eta_minutes,
            selected_time: self.draft.selected_time,
            special_requests: (!special.is_empty()).then(|| special.to_string()),
        })
    }

    /// Hand the order over. On failure the checkout stays at confirmation so the
    /// customer can try again; nothing is retried here.
    pub async fn submit(
        &mut self,
        cart: &CartStore,
        submitter: &dyn OrderSubmitter,
    ) -> Result<SubmittedOrder, CheckoutError> {
        self.expect_step(CheckoutStep::Confirmation)?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if cart.restaurant().map(|r| r.id) != Some(self.restaurant.id) {
            // cart moved to another restaurant since the last quote
            self.refresh_delivery(cart).await?;
        }
        self.check_address_step()?;

        let order = self.build_submission(cart)?;
        let accepted = match submitter.submit(&order).await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(restaurant = %self.restaurant.name, "Order submission failed: {}", e);
                return Err(e.into());
            }
        };

        info!(
            order_id = %accepted.order_id,
            order_number = %accepted.order_number,
            total = %accepted.total,
            "Order submitted"
        );
        self.publish(CheckoutEvent::Submitted {
            order_id: accepted.order_id,
            order_number: accepted.order_number.clone(),
            total: accepted.total,
            timestamp: self.engine.clock().now().timestamp(),
        });
        self.transition(CheckoutStep::Submitted);
        self.submitted = Some(accepted.clone());
        Ok(accepted)
    }

    /// Abandon checkout. The cart is left as it is.
    pub fn cancel(&mut self) -> Result<(), CheckoutError> {
        self.ensure_open()?;
        self.transition(CheckoutStep::Cancelled);
        self.publish(CheckoutEvent::Cancelled {
            timestamp: self.engine.clock().now().timestamp(),
        });
        Ok(())
    }

    fn build_submission(&self, cart: &CartStore) -> Result<OrderSubmission, CheckoutError> {
        let origin = self.origin(cart);
        let summary = self.summary(cart)?;
        let items = summary
            .items
            .iter()
            .map(|item| SubmissionItem {
                dish_id: item.dish.id,
                name: item.dish.name.clone(),
                unit_price: item.dish.price,
                quantity: item.quantity,
                line_total: item.line_total,
            })
            .collect();

        let (address, coordinate) = match self.draft.delivery_method {
            DeliveryMethod::Delivery => (self.draft.address.clone(), self.draft.coordinate),
            DeliveryMethod::Pickup => (origin.address.clone(), Some(origin.location)),
        };

        Ok(OrderSubmission {
            restaurant_id: origin.id,
            brand: origin.brand.clone(),
            items,
            subtotal: summary.subtotal,
            delivery_fee: summary.delivery_fee,
            tip: summary.tip,
            total: summary.total,
            delivery_method: self.draft.delivery_method,
            payment_method: self.draft.payment_method,
            recipient_name: self.draft.recipient_name.clone(),
            recipient_phone: self.draft.recipient_phone.clone(),
            address,
            coordinate,
            eta_minutes: summary.eta_minutes,
            scheduled_for: summary.selected_time,
            special_requests: summary.special_requests,
        })
    }

    /// Restaurant the cart currently ships from
    fn origin<'a>(&'a self, cart: &'a CartStore) -> &'a Restaurant {
        cart.restaurant().unwrap_or(&self.restaurant)
    }

    fn check_address_step(&self) -> Result<(), CheckoutError> {
        let mut missing = Vec::new();
        if self.draft.recipient_name.is_empty() {
            missing.push("recipient_name".to_string());
        }
        if self.draft.recipient_phone.is_blank() {
            missing.push("recipient_phone".to_string());
        }

        if self.draft.delivery_method == DeliveryMethod::Delivery {
            if !self.draft.has_destination() {
                missing.push("address".to_string());
            } else {
                match &self.draft.last_calculation {
                    Some(calc) if !calc.is_available => {
                        let reason = calc.reason.clone().unwrap_or_default();
                        return Err(CheckoutError::DeliveryUnavailable(reason));
                    }
                    Some(_) => {}
                    None => missing.push("delivery_quote".to_string()),
                }
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            debug!(?missing, "Checkout step incomplete");
            Err(CheckoutError::StepIncomplete(missing))
        }
    }

    fn expect_step(&self, expected: CheckoutStep) -> Result<(), CheckoutError> {
        self.ensure_open()?;
        if self.step != expected {
            return Err(CheckoutError::WrongStep { expected, actual: self.step });
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), CheckoutError> {
        if self.step.is_terminal() {
            return Err(CheckoutError::Finished(self.step));
        }
        Ok(())
    }

    fn transition(&mut self, to: CheckoutStep) {
        info!(from = %self.step, %to, "Checkout step changed");
        self.publish(CheckoutEvent::StepChanged {
            from: self.step.to_string(),
            to: to.to_string(),
        });
        self.step = to;
    }

    fn publish(&self, event: CheckoutEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event.into());
        }
    }
}
