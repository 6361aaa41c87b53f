//! Product aggregate implementation.

use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};
use crate::{Money, ProductId};

use super::{ProductError, ProductEvent, ProductListedData};

/// A sellable product and its on-hand stock.
///
/// The stream id is derived from the SKU, so listing the same SKU twice
/// collides on the stream rather than creating a duplicate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Product {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    sku: Option<ProductId>,
    title: String,
    price: Money,
    stock: u32,
    is_active: bool,
}

impl Aggregate for Product {
    type Event = ProductEvent;
    type Error = ProductError;

    fn aggregate_type() -> &'static str {
        "Product"
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
            ProductEvent::ProductListed(data) => self.apply_listed(data),
            ProductEvent::ProductRestocked(data) => {
                self.stock = self.stock.saturating_add(data.quantity);
            }
            ProductEvent::StockDecremented(data) => {
                self.stock = self.stock.saturating_sub(data.quantity);
            }
            ProductEvent::ProductDeactivated(_) => {
                self.is_active = false;
            }
        }
    }
}

impl SnapshotCapable for Product {
    fn snapshot_interval() -> usize {
        50
    }
}

// Query methods
impl Product {
    /// Returns the stream id for a SKU.
    pub fn id_for(sku: &ProductId) -> AggregateId {
        AggregateId::derived(Self::aggregate_type(), sku.as_str())
    }

    /// Returns the SKU.
    pub fn sku(&self) -> Option<&ProductId> {
        self.sku.as_ref()
    }

    /// Returns the title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the current unit price.
    pub fn price(&self) -> Money {
        self.price
    }

    /// Returns the units on hand.
    pub fn stock(&self) -> u32 {
        self.stock
    }

    /// Returns true if the product is listed and on sale.
    pub fn is_active(&self) -> bool {
        self.exists() && self.is_active
    }

    /// Returns true if `quantity` units are on hand.
    pub fn has_stock(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }
}

// Command methods (return events)
impl Product {
    /// Lists a new product.
    pub fn list(
        &self,
        product_id: AggregateId,
        sku: ProductId,
        title: &str,
        price: Money,
        stock: u32,
    ) -> Result<Vec<ProductEvent>, ProductError> {
        if self.exists() {
            return Err(ProductError::AlreadyListed { sku });
        }
        if sku.as_str().trim().is_empty() {
            return Err(ProductError::MissingSku);
        }
        if title.trim().is_empty() {
            return Err(ProductError::MissingTitle);
        }
        if price.is_negative() || price > Money::MAX_PRICE {
            return Err(ProductError::InvalidPrice {
                price: price.cents(),
                max: Money::MAX_PRICE.cents(),
            });
        }

        Ok(vec![ProductEvent::listed(
            product_id,
            sku,
            title.trim(),
            price,
            stock,
        )])
    }

    /// Adds units to stock.
    pub fn restock(&self, quantity: u32) -> Result<Vec<ProductEvent>, ProductError> {
        if !self.exists() {
            return Err(ProductError::NotListed);
        }
        if quantity == 0 {
            return Err(ProductError::InvalidQuantity { quantity });
        }

        Ok(vec![ProductEvent::restocked(quantity)])
    }

    /// Takes units from stock for a paid order.
    ///
    /// Stock never goes negative: a decrement larger than the units on hand
    /// is rejected.
    pub fn decrement_stock(
        &self,
        order_id: AggregateId,
        quantity: u32,
    ) -> Result<Vec<ProductEvent>, ProductError> {
        let Some(sku) = self.sku.clone() else {
            return Err(ProductError::NotListed);
        };
        if quantity == 0 {
            return Err(ProductError::InvalidQuantity { quantity });
        }
        if !self.has_stock(quantity) {
            return Err(ProductError::InsufficientStock {
                sku,
                available: self.stock,
                requested: quantity,
            });
        }

        Ok(vec![ProductEvent::stock_decremented(order_id, quantity)])
    }

    /// Withdraws the product from sale.
    pub fn deactivate(&self) -> Result<Vec<ProductEvent>, ProductError> {
        if !self.exists() {
            return Err(ProductError::NotListed);
        }
        if !self.is_active {
            return Ok(vec![]);
        }

        Ok(vec![ProductEvent::deactivated()])
    }
}

impl Product {
    fn apply_listed(&mut self, data: ProductListedData) {
        self.id = Some(data.product_id);
        self.sku = Some(data.sku);
        self.title = data.title;
        self.price = data.price;
        self.stock = data.stock;
        self.is_active = true;
    }
}
