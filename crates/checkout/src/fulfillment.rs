//! Registering shipments for paid orders.

use common::AggregateId;
use domain::{Aggregate, Order, Shipment, UnitOfWork};
use event_store::EventStore;

use crate::error::{CheckoutError, Result};
use crate::notifications::Notifier;
use crate::retry::RetryPolicy;

/// Creates shipments and moves their orders to shipped.
pub struct ShipmentRegistrar<S: EventStore> {
    store: S,
    notifier: Notifier,
    retry: RetryPolicy,
}

impl<S: EventStore> ShipmentRegistrar<S> {
    pub fn new(store: S, notifier: Notifier, retry: RetryPolicy) -> Self {
        Self {
            store,
            notifier,
            retry,
        }
    }

    /// Ships an order that is being processed.
    ///
    /// Fails if the order already has a shipment or the tracking number is
    /// in use; in either case the existing shipment is left as it was.
    #[tracing::instrument(skip(self))]
    pub async fn create_shipment(
        &self,
        order_id: AggregateId,
        carrier: &str,
        tracking_number: &str,
    ) -> Result<(Order, Shipment)> {
        let carrier = carrier.trim();
        let tracking_number = tracking_number.trim();
        if carrier.is_empty() || tracking_number.is_empty() {
            return Err(CheckoutError::Validation(
                "Carrier and tracking number are required.".to_string(),
            ));
        }

        let (order, shipment) = self
            .retry
            .run("create shipment", || async move {
                self.try_create(order_id, carrier, tracking_number).await
            })
            .await?;

        metrics::counter!("shipments_created_total").increment(1);
        tracing::info!(%order_id, carrier, tracking_number, "shipment created");
        self.notifier.order_shipped(order_id, &order);

        Ok((order, shipment))
    }

    async fn try_create(
        &self,
        order_id: AggregateId,
        carrier: &str,
        tracking_number: &str,
    ) -> Result<(Order, Shipment)> {
        let mut uow = UnitOfWork::begin(&self.store);

        let mut order: Order = uow.load(order_id).await?;
        if !order.exists() {
            return Err(CheckoutError::NotFound("Order not found.".to_string()));
        }

        let shipment_id = Shipment::id_for(tracking_number);
        let mut shipment: Shipment = uow.load(shipment_id).await?;
        uow.execute(order_id, &mut order, |o| {
            o.ship(shipment_id, carrier, tracking_number)
        })?;
        uow.execute(shipment_id, &mut shipment, |s| {
            s.create(order_id, carrier, tracking_number)
        })?;

        uow.commit().await?;
        Ok((order, shipment))
    }
}
