//! Settling payments for placed orders.

use std::collections::BTreeMap;

use chrono::Utc;
use common::AggregateId;
use domain::{Order, Payment, Product, ProductId, TransactionStatus, UnitOfWork};
use event_store::EventStore;
use serde::Serialize;

use crate::error::Result;
use crate::notifications::Notifier;
use crate::retry::RetryPolicy;

/// Outcome of settling a payment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub order_id: AggregateId,
    pub status: TransactionStatus,
    pub provider_payment_id: Option<String>,
}

/// Applies payment results reported by the gateway.
pub struct PaymentConfirmationService<S: EventStore> {
    store: S,
    notifier: Notifier,
    retry: RetryPolicy,
}

impl<S: EventStore> PaymentConfirmationService<S> {
    pub fn new(store: S, notifier: Notifier, retry: RetryPolicy) -> Self {
        Self {
            store,
            notifier,
            retry,
        }
    }

    /// Confirms the payment of an order.
    ///
    /// In one commit the order moves to processing with its payment
    /// completed, the payment succeeds, and every purchased product loses the
    /// units bought. A decrement that would take stock below zero fails the
    /// whole confirmation. A confirmation that loses a race re-reads and
    /// finds the order already paid, so stock is taken exactly once.
    #[tracing::instrument(skip(self))]
    pub async fn confirm(&self, order_id: AggregateId) -> Result<PaymentOutcome> {
        metrics::counter!("payment_confirmations_total").increment(1);
        let provider_payment_id = format!("sim_{}", Utc::now().timestamp_millis());
        let provider_payment_id = provider_payment_id.as_str();

        let order = self
            .retry
            .run("verify payment", || async move {
                self.try_confirm(order_id, provider_payment_id).await
            })
            .await?;

        tracing::info!(%order_id, provider_payment_id, "payment confirmed");
        self.notifier.order_confirmed(order_id, &order);

        Ok(PaymentOutcome {
            order_id,
            status: TransactionStatus::Success,
            provider_payment_id: Some(provider_payment_id.to_string()),
        })
    }

    /// Records a declined payment. The order keeps its status.
    #[tracing::instrument(skip(self))]
    pub async fn decline(&self, order_id: AggregateId, reason: &str) -> Result<PaymentOutcome> {
        let reason = match reason.trim() {
            "" => "Payment declined",
            reason => reason,
        };

        self.retry
            .run("record payment failure", || async move {
                self.try_decline(order_id, reason).await
            })
            .await?;

        tracing::info!(%order_id, reason, "payment declined");
        Ok(PaymentOutcome {
            order_id,
            status: TransactionStatus::Failed,
            provider_payment_id: None,
        })
    }

    async fn try_confirm(&self, order_id: AggregateId, provider_payment_id: &str) -> Result<Order> {
        let mut uow = UnitOfWork::begin(&self.store);

        let mut order: Order = uow.load(order_id).await?;
        uow.execute(order_id, &mut order, |o| {
            o.complete_payment(provider_payment_id)
        })?;

        let payment_id = Payment::id_for(order_id);
        let mut payment: Payment = uow.load(payment_id).await?;
        uow.execute(payment_id, &mut payment, |p| p.succeed(provider_payment_id))?;

        for (sku, quantity) in purchased_quantities(&order) {
            let product_id = Product::id_for(&sku);
            let mut product: Product = uow.load(product_id).await?;
            uow.execute(product_id, &mut product, |p| {
                p.decrement_stock(order_id, quantity)
            })?;
            uow.snapshot_if_due(product_id, &product)?;
        }

        uow.commit().await?;
        Ok(order)
    }

    async fn try_decline(&self, order_id: AggregateId, reason: &str) -> Result<()> {
        let mut uow = UnitOfWork::begin(&self.store);

        let mut order: Order = uow.load(order_id).await?;
        uow.execute(order_id, &mut order, |o| o.fail_payment(reason))?;

        let payment_id = Payment::id_for(order_id);
        let mut payment: Payment = uow.load(payment_id).await?;
        uow.execute(payment_id, &mut payment, |p| p.decline(reason))?;

        uow.commit().await?;
        Ok(())
    }
}

/// Units per product, so each product stream is touched once.
fn purchased_quantities(order: &Order) -> BTreeMap<ProductId, u32> {
    let mut quantities = BTreeMap::new();
    for item in order.items() {
        *quantities.entry(item.product_id.clone()).or_insert(0u32) += item.quantity;
    }
    quantities
}
