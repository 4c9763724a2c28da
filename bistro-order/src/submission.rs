use async_trait::async_trait;
use bistro_core::{OrderSubmission, OrderSubmitter, SubmissionError, SubmittedOrder};
use rand::Rng;
use std::collections::VecDeque;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_RETAINED_ORDERS: usize = 1000;

/// Order sink kept in memory for local runs and tests. Not a system of record:
/// only the most recent `capacity` orders are kept.
pub struct InMemoryOrderSubmitter {
    orders: RwLock<VecDeque<(SubmittedOrder, OrderSubmission)>>,
    capacity: usize,
}

impl Default for InMemoryOrderSubmitter {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RETAINED_ORDERS)
    }
}

impl InMemoryOrderSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            orders: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub async fn orders(&self) -> Vec<SubmittedOrder> {
        self.orders.read().await.iter().map(|(accepted, _)| accepted.clone()).collect()
    }

    pub async fn find(&self, order_number: &str) -> Option<OrderSubmission> {
        self.orders
            .read()
            .await
            .iter()
            .find(|(accepted, _)| accepted.order_number == order_number)
            .map(|(_, order)| order.clone())
    }
}

/// `"{brand code}-{four digits}"`, e.g. `THE-4821`
pub fn order_number(order: &OrderSubmission) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(1000..=9999);
    format!("{}-{}", order.brand.short_code(), suffix)
}

fn validate(order: &OrderSubmission) -> Result<(), SubmissionError> {
    if order.items.is_empty() {
        return Err(SubmissionError::Validation("order has no items".to_string()));
    }
    if order.recipient_name.trim().is_empty() || order.recipient_phone.is_blank() {
        return Err(SubmissionError::Validation("recipient contact is required".to_string()));
    }
    let expected = order
        .subtotal
        .checked_add(order.delivery_fee)
        .and_then(|sum| sum.checked_add(order.tip))
        .ok_or_else(|| SubmissionError::Validation("order amounts are out of range".to_string()))?;
    if order.total != expected {
        return Err(SubmissionError::Validation(format!(
            "total {} does not match {}",
            order.total, expected
        )));
    }
    Ok(())
}

#[async_trait]
impl OrderSubmitter for InMemoryOrderSubmitter {
    async fn submit(&self, order: &OrderSubmission) -> Result<SubmittedOrder, SubmissionError> {
        validate(order)?;

        let accepted = SubmittedOrder {
            order_id: Uuid::new_v4(),
            order_number: order_number(order),
            total: order.total,
            accepted_at: chrono::Utc::now(),
        };

        info!(
            order_number = %accepted.order_number,
            recipient = %order.recipient_phone,
            items = order.items.len(),
            "Order accepted"
        );
        let mut orders = self.orders.write().await;
        orders.push_back((accepted.clone(), order.clone()));
        while orders.len() > self.capacity {
            if let Some((dropped, _)) = orders.pop_front() {
                debug!(order_number = %dropped.order_number, "Dropped oldest retained order");
            }
        }
        Ok(accepted)
    }
}
