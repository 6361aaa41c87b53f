//! Cart domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::{CustomerId, Money, ProductId};

/// Events that can occur on a cart aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CartEvent {
    /// Cart was created for a customer.
    CartOpened(CartOpenedData),

    /// A product line was added.
    CartItemAdded(CartItemAddedData),

    /// The quantity of an existing line was set.
    CartItemQuantitySet(CartItemQuantitySetData),

    /// A product line was removed.
    CartItemRemoved(CartItemRemovedData),

    /// All lines were removed.
    CartCleared(CartClearedData),
}

impl DomainEvent for CartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CartEvent::CartOpened(_) => "CartOpened",
            CartEvent::CartItemAdded(_) => "CartItemAdded",
            CartEvent::CartItemQuantitySet(_) => "CartItemQuantitySet",
            CartEvent::CartItemRemoved(_) => "CartItemRemoved",
            CartEvent::CartCleared(_) => "CartCleared",
        }
    }
}

/// Data for CartOpened event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartOpenedData {
    pub cart_id: AggregateId,
    pub customer_id: CustomerId,
    pub opened_at: DateTime<Utc>,
}

/// Data for CartItemAdded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemAddedData {
    pub product_id: ProductId,
    pub quantity: u32,

    /// Unit price captured when the line was added.
    pub unit_price: Money,
}

/// Data for CartItemQuantitySet event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemQuantitySetData {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Data for CartItemRemoved event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemRemovedData {
    pub product_id: ProductId,
}

/// Data for CartCleared event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartClearedData {
    /// The order the cart was converted into, if cleared by checkout.
    pub order_id: Option<AggregateId>,
    pub cleared_at: DateTime<Utc>,
}

impl CartEvent {
    /// Creates a CartOpened event.
    pub fn opened(cart_id: AggregateId, customer_id: CustomerId) -> Self {
        CartEvent::CartOpened(CartOpenedData {
            cart_id,
            customer_id,
            opened_at: Utc::now(),
        })
    }

    /// Creates a CartItemAdded event.
    pub fn item_added(product_id: ProductId, quantity: u32, unit_price: Money) -> Self {
        CartEvent::CartItemAdded(CartItemAddedData {
            product_id,
            quantity,
            unit_price,
        })
    }

    /// Creates a CartItemQuantitySet event.
    pub fn quantity_set(product_id: ProductId, quantity: u32) -> Self {
        CartEvent::CartItemQuantitySet(CartItemQuantitySetData {
            product_id,
            quantity,
        })
    }

    /// Creates a CartItemRemoved event.
    pub fn item_removed(product_id: ProductId) -> Self {
        CartEvent::CartItemRemoved(CartItemRemovedData { product_id })
    }

    /// Creates a CartCleared event.
    pub fn cleared(order_id: Option<AggregateId>) -> Self {
        CartEvent::CartCleared(CartClearedData {
            order_id,
            cleared_at: Utc::now(),
        })
    }
}
