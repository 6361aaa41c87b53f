//! Product domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::{Money, ProductId};

/// Events that can occur on a product aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ProductEvent {
    /// Product was added to the catalog.
    ProductListed(ProductListedData),

    /// Units were added to stock.
    ProductRestocked(ProductRestockedData),

    /// Units were taken from stock for a paid order.
    StockDecremented(StockDecrementedData),

    /// Product was withdrawn from sale.
    ProductDeactivated(ProductDeactivatedData),
}

impl DomainEvent for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductListed(_) => "ProductListed",
            ProductEvent::ProductRestocked(_) => "ProductRestocked",
            ProductEvent::StockDecremented(_) => "StockDecremented",
            ProductEvent::ProductDeactivated(_) => "ProductDeactivated",
        }
    }
}

/// Data for ProductListed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListedData {
    pub product_id: AggregateId,
    pub sku: ProductId,
    pub title: String,
    pub price: Money,
    pub stock: u32,
    pub listed_at: DateTime<Utc>,
}

/// Data for ProductRestocked event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRestockedData {
    pub quantity: u32,
}

/// Data for StockDecremented event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockDecrementedData {
    /// The order whose confirmed payment consumed the units.
    pub order_id: AggregateId,
    pub quantity: u32,
}

/// Data for ProductDeactivated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDeactivatedData {
    pub deactivated_at: DateTime<Utc>,
}

impl ProductEvent {
    /// Creates a ProductListed event.
    pub fn listed(
        product_id: AggregateId,
        sku: ProductId,
        title: impl Into<String>,
        price: Money,
        stock: u32,
    ) -> Self {
        ProductEvent::ProductListed(ProductListedData {
            product_id,
            sku,
            title: title.into(),
            price,
            stock,
            listed_at: Utc::now(),
        })
    }

    /// Creates a ProductRestocked event.
    pub fn restocked(quantity: u32) -> Self {
        ProductEvent::ProductRestocked(ProductRestockedData { quantity })
    }

    /// Creates a StockDecremented event.
    pub fn stock_decremented(order_id: AggregateId, quantity: u32) -> Self {
        ProductEvent::StockDecremented(StockDecrementedData { order_id, quantity })
    }

    /// Creates a ProductDeactivated event.
    pub fn deactivated() -> Self {
        ProductEvent::ProductDeactivated(ProductDeactivatedData {
            deactivated_at: Utc::now(),
        })
    }
}
