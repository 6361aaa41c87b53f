//! Order lookups and administrative status changes.

use common::AggregateId;
use domain::{
    Aggregate, CommandHandler, CustomerId, Order, OrderStatus, Payment, load_aggregate,
};
use event_store::EventStore;

use crate::error::{CheckoutError, Result};
use crate::retry::RetryPolicy;

/// Reads orders and applies administrative status changes.
pub struct OrderService<S: EventStore> {
    orders: CommandHandler<S, Order>,
    retry: RetryPolicy,
}

impl<S: EventStore> OrderService<S> {
    pub fn new(store: S, retry: RetryPolicy) -> Self {
        Self {
            orders: CommandHandler::new(store),
            retry,
        }
    }

    /// Returns an order placed by `customer_id`.
    ///
    /// Orders of other customers are reported as missing.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, customer_id: CustomerId, order_id: AggregateId) -> Result<Order> {
        self.find_order(order_id)
            .await?
            .filter(|order| order.is_owned_by(customer_id))
            .ok_or_else(not_found)
    }

    /// Returns any order, regardless of owner.
    pub async fn find_order(&self, order_id: AggregateId) -> Result<Option<Order>> {
        Ok(self.orders.load_existing(order_id).await?)
    }

    /// Returns the payment attached to an order.
    pub async fn get_payment(&self, order_id: AggregateId) -> Result<Payment> {
        let payment: Payment =
            load_aggregate(self.orders.store(), Payment::id_for(order_id)).await?;
        if !payment.exists() {
            return Err(CheckoutError::NotFound("Payment not found".to_string()));
        }
        Ok(payment)
    }

    /// Moves an order to `status`.
    ///
    /// `status` is parsed case-insensitively. `PENDING` and unknown names are
    /// invalid; a known status the order cannot move to is a state error.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, order_id: AggregateId, status: &str) -> Result<Order> {
        let target: OrderStatus = status
            .parse()
            .ok()
            .filter(|target| *target != OrderStatus::Pending)
            .ok_or_else(|| CheckoutError::Validation("Invalid status update".to_string()))?;

        let order = self
            .retry
            .run("update order status", || async move {
                let result = self
                    .orders
                    .execute(order_id, |o| o.transition_to(target))
                    .await?;
                Ok::<_, CheckoutError>(result.aggregate)
            })
            .await?;

        tracing::info!(%order_id, status = %target, "order status updated");
        Ok(order)
    }
}

fn not_found() -> CheckoutError {
    CheckoutError::NotFound("Order not found".to_string())
}
