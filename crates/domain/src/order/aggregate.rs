//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::{AddressId, CustomerId, LineItem, Money};

use super::{
    OrderError, OrderEvent, OrderStatus, PaymentStatus, PlaceOrder, events::OrderPlacedData,
};

/// Order aggregate root.
///
/// Items and amounts are fixed when the order is placed. Afterwards only the
/// two status axes move: the payment status through confirmation or decline,
/// and the order status through confirmation, shipment and admin updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    id: Option<AggregateId>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    customer_id: Option<CustomerId>,
    address_id: Option<AddressId>,
    items: Vec<LineItem>,
    subtotal: Money,
    coupon_code: Option<String>,
    discount: Money,
    total: Money,
    status: OrderStatus,
    payment_status: PaymentStatus,
    payment_provider: Option<String>,
    provider_payment_id: Option<String>,
    shipment_id: Option<AggregateId>,
    carrier: Option<String>,
    tracking_number: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for Order {
    type Event = OrderEvent;
    type Error = OrderError;

    fn aggregate_type() -> &'static str {
        "Order"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            OrderEvent::OrderPlaced(data) => self.apply_placed(data),
            OrderEvent::PaymentCompleted(data) => {
                self.payment_status = PaymentStatus::Completed;
                self.status = OrderStatus::Processing;
                self.provider_payment_id = Some(data.provider_payment_id);
                self.updated_at = Some(data.completed_at);
            }
            OrderEvent::PaymentFailed(data) => {
                self.payment_status = PaymentStatus::Failed;
                self.updated_at = Some(data.failed_at);
            }
            OrderEvent::OrderShipped(data) => {
                self.status = OrderStatus::Shipped;
                self.shipment_id = Some(data.shipment_id);
                self.carrier = Some(data.carrier);
                self.tracking_number = Some(data.tracking_number);
                self.updated_at = Some(data.shipped_at);
            }
            OrderEvent::StatusChanged(data) => {
                self.status = data.to;
                self.updated_at = Some(data.changed_at);
            }
        }
    }
}

// Query methods
impl Order {
    /// Returns the customer ID.
    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    /// Returns true if the order belongs to `customer_id`.
    pub fn is_owned_by(&self, customer_id: CustomerId) -> bool {
        self.customer_id == Some(customer_id)
    }

    pub fn address_id(&self) -> Option<AddressId> {
        self.address_id
    }

    /// Returns the purchased lines.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Returns the total quantity of all items.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon_code.as_deref()
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    /// Returns the amount charged: subtotal minus discount.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Returns the current fulfillment status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the current payment status.
    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn payment_provider(&self) -> Option<&str> {
        self.payment_provider.as_deref()
    }

    pub fn provider_payment_id(&self) -> Option<&str> {
        self.provider_payment_id.as_deref()
    }

    pub fn shipment_id(&self) -> Option<AggregateId> {
        self.shipment_id
    }

    pub fn carrier(&self) -> Option<&str> {
        self.carrier.as_deref()
    }

    pub fn tracking_number(&self) -> Option<&str> {
        self.tracking_number.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

// Command methods (return events)
impl Order {
    /// Places a new order.
    pub fn place(&self, command: &PlaceOrder) -> Result<Vec<OrderEvent>, OrderError> {
        if self.exists() {
            return Err(OrderError::AlreadyPlaced);
        }
        if command.items.is_empty() {
            return Err(OrderError::NoItems);
        }

        let subtotal: Money = command.items.iter().map(LineItem::total_price).sum();
        if command.discount.is_negative() || command.discount > subtotal {
            return Err(OrderError::InvalidDiscount {
                discount: command.discount,
                subtotal,
            });
        }

        Ok(vec![OrderEvent::placed(command)])
    }

    /// Marks the payment completed and moves the order to processing.
    ///
    /// A second confirmation is rejected with [`OrderError::AlreadyPaid`] so
    /// its side effects are never applied twice.
    pub fn complete_payment(
        &self,
        provider_payment_id: impl Into<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        self.ensure_payment_pending()?;
        if !self.status.can_transition_to(OrderStatus::Processing) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: OrderStatus::Processing,
            });
        }

        Ok(vec![OrderEvent::payment_completed(provider_payment_id)])
    }

    /// Marks the payment failed. The order status is left unchanged.
    pub fn fail_payment(&self, reason: impl Into<String>) -> Result<Vec<OrderEvent>, OrderError> {
        self.ensure_payment_pending()?;

        Ok(vec![OrderEvent::payment_failed(reason)])
    }

    /// Records a shipment and moves the order to shipped.
    pub fn ship(
        &self,
        shipment_id: AggregateId,
        carrier: &str,
        tracking_number: &str,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if !self.exists() {
            return Err(OrderError::NotFound);
        }
        if self.shipment_id.is_some() {
            return Err(OrderError::ShipmentExists);
        }
        if self.status != OrderStatus::Processing {
            return Err(OrderError::CannotShip {
                current: self.status,
            });
        }

        Ok(vec![OrderEvent::shipped(
            shipment_id,
            carrier,
            tracking_number,
        )])
    }

    /// Applies an administrative status change.
    ///
    /// `PENDING` is never a valid target. Other targets must be the next step
    /// of the chain, or `CANCELLED` from a non-terminal status.
    pub fn transition_to(&self, target: OrderStatus) -> Result<Vec<OrderEvent>, OrderError> {
        if !self.exists() {
            return Err(OrderError::NotFound);
        }
        if target == OrderStatus::Pending {
            return Err(OrderError::InvalidTargetStatus { status: target });
        }
        if !self.status.can_transition_to(target) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        match target {
            OrderStatus::Processing if self.payment_status != PaymentStatus::Completed => {
                return Err(OrderError::PaymentIncomplete {
                    current: self.payment_status,
                });
            }
            OrderStatus::Shipped if self.shipment_id.is_none() => {
                return Err(OrderError::ShipmentRequired);
            }
            _ => {}
        }

        Ok(vec![OrderEvent::status_changed(self.status, target)])
    }
}

impl Order {
    fn ensure_payment_pending(&self) -> Result<(), OrderError> {
        if !self.exists() {
            return Err(OrderError::NotFound);
        }
        match self.payment_status {
            PaymentStatus::Pending => Ok(()),
            PaymentStatus::Completed => Err(OrderError::AlreadyPaid),
            current => Err(OrderError::PaymentNotPending { current }),
        }
    }

    fn apply_placed(&mut self, data: OrderPlacedData) {
        self.id = Some(data.order_id);
        self.customer_id = Some(data.customer_id);
        self.address_id = Some(data.address_id);
        self.items = data.items;
        self.subtotal = data.subtotal;
        self.coupon_code = data.coupon_code;
        self.discount = data.discount;
        self.total = data.total;
        self.status = OrderStatus::Pending;
        self.payment_status = PaymentStatus::Pending;
        self.payment_provider = Some(data.payment_provider);
        self.created_at = Some(data.placed_at);
        self.updated_at = Some(data.placed_at);
    }
}
