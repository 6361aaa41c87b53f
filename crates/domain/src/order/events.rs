//! Order domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::{AddressId, CustomerId, LineItem, Money};

use super::{OrderStatus, PlaceOrder};

/// Events that can occur on an order aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Order was placed from a cart at checkout.
    OrderPlaced(OrderPlacedData),

    /// Payment was confirmed; the order moves to processing.
    PaymentCompleted(PaymentCompletedData),

    /// Payment was declined.
    PaymentFailed(PaymentFailedData),

    /// A shipment was registered for the order.
    OrderShipped(OrderShippedData),

    /// An administrator changed the status.
    StatusChanged(StatusChangedData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "OrderPlaced",
            OrderEvent::PaymentCompleted(_) => "PaymentCompleted",
            OrderEvent::PaymentFailed(_) => "PaymentFailed",
            OrderEvent::OrderShipped(_) => "OrderShipped",
            OrderEvent::StatusChanged(_) => "StatusChanged",
        }
    }
}

/// Data for OrderPlaced event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedData {
    pub order_id: AggregateId,
    pub customer_id: CustomerId,
    pub address_id: AddressId,

    /// Lines priced as they were in the cart.
    pub items: Vec<LineItem>,

    pub subtotal: Money,
    pub coupon_code: Option<String>,
    pub discount: Money,
    pub total: Money,

    /// Payment provider tag.
    pub payment_provider: String,

    pub placed_at: DateTime<Utc>,
}

/// Data for PaymentCompleted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCompletedData {
    pub provider_payment_id: String,
    pub completed_at: DateTime<Utc>,
}

/// Data for PaymentFailed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentFailedData {
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

/// Data for OrderShipped event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderShippedData {
    pub shipment_id: AggregateId,
    pub carrier: String,
    pub tracking_number: String,
    pub shipped_at: DateTime<Utc>,
}

/// Data for StatusChanged event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangedData {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub changed_at: DateTime<Utc>,
}

// Convenience constructors for events
impl OrderEvent {
    /// Creates an OrderPlaced event, deriving the totals from the lines.
    pub fn placed(command: &PlaceOrder) -> Self {
        let subtotal: Money = command.items.iter().map(LineItem::total_price).sum();
        OrderEvent::OrderPlaced(OrderPlacedData {
            order_id: command.order_id,
            customer_id: command.customer_id,
            address_id: command.address_id,
            items: command.items.clone(),
            subtotal,
            coupon_code: command.coupon_code.clone(),
            discount: command.discount,
            total: subtotal - command.discount,
            payment_provider: command.payment_provider.clone(),
            placed_at: Utc::now(),
        })
    }

    /// Creates a PaymentCompleted event.
    pub fn payment_completed(provider_payment_id: impl Into<String>) -> Self {
        OrderEvent::PaymentCompleted(PaymentCompletedData {
            provider_payment_id: provider_payment_id.into(),
            completed_at: Utc::now(),
        })
    }

    /// Creates a PaymentFailed event.
    pub fn payment_failed(reason: impl Into<String>) -> Self {
        OrderEvent::PaymentFailed(PaymentFailedData {
            reason: reason.into(),
            failed_at: Utc::now(),
        })
    }

    /// Creates an OrderShipped event.
    pub fn shipped(
        shipment_id: AggregateId,
        carrier: impl Into<String>,
        tracking_number: impl Into<String>,
    ) -> Self {
        OrderEvent::OrderShipped(OrderShippedData {
            shipment_id,
            carrier: carrier.into(),
            tracking_number: tracking_number.into(),
            shipped_at: Utc::now(),
        })
    }

    /// Creates a StatusChanged event.
    pub fn status_changed(from: OrderStatus, to: OrderStatus) -> Self {
        OrderEvent::StatusChanged(StatusChangedData {
            from,
            to,
            changed_at: Utc::now(),
        })
    }
}
