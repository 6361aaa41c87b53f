//! Order aggregate and related types.

mod aggregate;
mod events;
mod state;

pub use aggregate::Order;
pub use events::{
    OrderEvent, OrderPlacedData, OrderShippedData, PaymentCompletedData, PaymentFailedData,
    StatusChangedData,
};
pub use state::{OrderStatus, PaymentStatus, UnknownStatus};

use common::AggregateId;
use thiserror::Error;

use crate::{AddressId, CustomerId, LineItem, Money};

/// Command to place an order from a cart.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub order_id: AggregateId,
    pub customer_id: CustomerId,
    pub address_id: AddressId,

    /// Lines at their cart prices.
    pub items: Vec<LineItem>,

    /// The applied coupon, if any.
    pub coupon_code: Option<String>,

    /// Amount taken off the subtotal; zero without a coupon.
    pub discount: Money,

    pub payment_provider: String,
}

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found")]
    NotFound,

    #[error("Order already placed")]
    AlreadyPlaced,

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    #[error("Invalid discount: {discount} exceeds subtotal {subtotal}")]
    InvalidDiscount { discount: Money, subtotal: Money },

    /// Payment was already completed; confirming again must not repeat its effects.
    #[error("Payment has already been completed for this order.")]
    AlreadyPaid,

    #[error("Payment is {current}, expected PENDING")]
    PaymentNotPending { current: PaymentStatus },

    /// The requested status is not one an administrator may set.
    #[error("Invalid status update: {status}")]
    InvalidTargetStatus { status: OrderStatus },

    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// PROCESSING is reached through payment confirmation only.
    #[error("Order payment is {current}. An order moves to PROCESSING once its payment is completed.")]
    PaymentIncomplete { current: PaymentStatus },

    #[error("Order has no shipment. Register a shipment to mark it SHIPPED.")]
    ShipmentRequired,

    #[error("Order cannot be shipped. Current status: {current}")]
    CannotShip { current: OrderStatus },

    #[error("A shipment already exists for this order.")]
    ShipmentExists,
}
