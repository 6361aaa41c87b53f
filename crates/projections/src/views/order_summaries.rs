//! Order summaries read model: one row per order, listable per customer.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{CustomerId, LineItem, Money, OrderEvent, OrderStatus, PaymentStatus};
use event_store::EventEnvelope;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::{ProjectionError, Result};
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Denormalized view of one order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_id: AggregateId,
    pub customer_id: CustomerId,
    pub items: Vec<LineItem>,
    pub item_count: u32,
    pub subtotal: Money,
    pub coupon_code: Option<String>,
    pub discount: Money,
    pub total: Money,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

struct OrderSummariesState {
    orders: HashMap<AggregateId, OrderSummary>,
    position: ProjectionPosition,
}

/// Read model view listing orders newest first.
#[derive(Clone)]
pub struct OrderSummariesView {
    state: Arc<RwLock<OrderSummariesState>>,
}

impl OrderSummariesView {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(OrderSummariesState {
                orders: HashMap::new(),
                position: ProjectionPosition::zero(),
            })),
        }
    }

    pub async fn get(&self, order_id: AggregateId) -> Option<OrderSummary> {
        self.state.read().await.orders.get(&order_id).cloned()
    }

    /// Orders placed by one customer, newest first.
    pub async fn for_customer(&self, customer_id: CustomerId) -> Vec<OrderSummary> {
        let state = self.state.read().await;
        newest_first(
            state
                .orders
                .values()
                .filter(|o| o.customer_id == customer_id)
                .cloned()
                .collect(),
        )
    }

    /// Every order, newest first.
    pub async fn all(&self) -> Vec<OrderSummary> {
        let state = self.state.read().await;
        newest_first(state.orders.values().cloned().collect())
    }

    /// Orders currently in `status`, newest first.
    pub async fn with_status(&self, status: OrderStatus) -> Vec<OrderSummary> {
        let state = self.state.read().await;
        newest_first(
            state
                .orders
                .values()
                .filter(|o| o.status == status)
                .cloned()
                .collect(),
        )
    }
}

fn newest_first(mut orders: Vec<OrderSummary>) -> Vec<OrderSummary> {
    // Ties on timestamp fall back to the id so listings are stable
    orders.sort_by(|a, b| {
        b.placed_at
            .cmp(&a.placed_at)
            .then_with(|| b.order_id.as_uuid().cmp(&a.order_id.as_uuid()))
    });
    orders
}

impl Default for OrderSummariesView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for OrderSummariesView {
    fn name(&self) -> &'static str {
        "OrderSummariesView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type != "Order" {
            let mut state = self.state.write().await;
            state.position = state.position.advance();
            return Ok(());
        }

        let order_event: OrderEvent = serde_json::from_value(event.payload.clone())?;
        let order_id = event.aggregate_id;
        let at = event.timestamp;

        let mut state = self.state.write().await;

        match order_event {
            OrderEvent::OrderPlaced(data) => {
                let item_count = data.items.iter().map(|i| i.quantity).sum();
                state.orders.insert(
                    order_id,
                    OrderSummary {
                        order_id,
                        customer_id: data.customer_id,
                        items: data.items,
                        item_count,
                        subtotal: data.subtotal,
                        coupon_code: data.coupon_code,
                        discount: data.discount,
                        total: data.total,
                        status: OrderStatus::Pending,
                        payment_status: PaymentStatus::Pending,
                        carrier: None,
                        tracking_number: None,
                        placed_at: data.placed_at,
                        updated_at: data.placed_at,
                    },
                );
            }
            other => {
                let order = state.orders.get_mut(&order_id).ok_or(
                    ProjectionError::UnknownAggregate {
                        projection: "OrderSummariesView",
                        aggregate_id: order_id,
                    },
                )?;
                match other {
                    // Placement is handled above
                    OrderEvent::OrderPlaced(_) => {}
                    OrderEvent::PaymentCompleted(_) => {
                        order.payment_status = PaymentStatus::Completed;
                        order.status = OrderStatus::Processing;
                    }
                    OrderEvent::PaymentFailed(_) => {
                        order.payment_status = PaymentStatus::Failed;
                    }
                    OrderEvent::OrderShipped(data) => {
                        order.status = OrderStatus::Shipped;
                        order.carrier = Some(data.carrier);
                        order.tracking_number = Some(data.tracking_number);
                    }
                    OrderEvent::StatusChanged(data) => {
                        order.status = data.to;
                    }
                }
                order.updated_at = at;
            }
        }

        state.position = state.position.advance();
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.orders.clear();
        state.position = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for OrderSummariesView {
    fn name(&self) -> &'static str {
        "OrderSummariesView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.orders.len()).unwrap_or(0)
    }
}
