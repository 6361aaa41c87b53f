//! Cart aggregate implementation.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::{CustomerId, LineItem, Money, ProductId};

use super::{CartError, CartEvent};

/// A customer's shopping cart.
///
/// Each customer has at most one cart; its stream id is derived from the
/// customer id. The total always equals the sum of `quantity * unit_price`
/// over the current lines and is recomputed whenever an event is applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    customer_id: Option<CustomerId>,

    /// Lines in insertion order.
    items: Vec<LineItem>,

    total: Money,

    updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for Cart {
    type Event = CartEvent;
    type Error = CartError;

    fn aggregate_type() -> &'static str {
        "Cart"
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
            CartEvent::CartOpened(data) => {
                self.id = Some(data.cart_id);
                self.customer_id = Some(data.customer_id);
                self.updated_at = Some(data.opened_at);
            }
            CartEvent::CartItemAdded(data) => {
                self.items
                    .push(LineItem::new(data.product_id, data.quantity, data.unit_price));
                self.touch();
            }
            CartEvent::CartItemQuantitySet(data) => {
                if let Some(item) = self
                    .items
                    .iter_mut()
                    .find(|item| item.product_id == data.product_id)
                {
                    item.quantity = data.quantity;
                }
                self.touch();
            }
            CartEvent::CartItemRemoved(data) => {
                self.items.retain(|item| item.product_id != data.product_id);
                self.touch();
            }
            CartEvent::CartCleared(data) => {
                self.items.clear();
                self.updated_at = Some(data.cleared_at);
            }
        }
        self.total = self.items.iter().map(LineItem::total_price).sum();
    }
}

// Query methods
impl Cart {
    /// Returns the stream id of a customer's cart.
    pub fn id_for(customer_id: CustomerId) -> AggregateId {
        AggregateId::derived(Self::aggregate_type(), &customer_id.to_string())
    }

    /// Returns the owner.
    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    /// Returns the lines in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Returns a line by product.
    pub fn get_item(&self, product_id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    /// Returns the cart total.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns when the cart last changed.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

// Command methods (return events)
impl Cart {
    /// Creates the cart if it does not exist yet; otherwise does nothing.
    pub fn open(
        &self,
        cart_id: AggregateId,
        customer_id: CustomerId,
    ) -> Result<Vec<CartEvent>, CartError> {
        if self.exists() {
            return Ok(vec![]);
        }
        Ok(vec![CartEvent::opened(cart_id, customer_id)])
    }

    /// Adds units of a product, merging with an existing line.
    ///
    /// A new line captures `unit_price`; a merged line keeps its original price.
    pub fn add_item(
        &self,
        product_id: ProductId,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Vec<CartEvent>, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }

        match self.get_item(&product_id) {
            Some(existing) => {
                let merged = existing.quantity.saturating_add(quantity);
                let unit_price = existing.unit_price;
                self.check_line(&product_id, merged, unit_price)?;
                Ok(vec![CartEvent::quantity_set(product_id, merged)])
            }
            None => {
                self.check_line(&product_id, quantity, unit_price)?;
                Ok(vec![CartEvent::item_added(product_id, quantity, unit_price)])
            }
        }
    }

    /// Sets the quantity of an existing line.
    pub fn set_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Vec<CartEvent>, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }
        if !self.exists() {
            return Err(CartError::NotFound);
        }

        let existing = self
            .get_item(&product_id)
            .ok_or_else(|| CartError::ItemNotFound {
                product_id: product_id.clone(),
            })?;

        if existing.quantity == quantity {
            return Ok(vec![]);
        }
        self.check_line(&product_id, quantity, existing.unit_price)?;
        Ok(vec![CartEvent::quantity_set(product_id, quantity)])
    }

    /// Removes a line. Removing a product that is not in the cart is a no-op.
    pub fn remove_item(&self, product_id: ProductId) -> Result<Vec<CartEvent>, CartError> {
        if !self.exists() {
            return Err(CartError::NotFound);
        }
        if self.get_item(&product_id).is_none() {
            return Ok(vec![]);
        }
        Ok(vec![CartEvent::item_removed(product_id)])
    }

    /// Removes every line.
    ///
    /// Always records an event, so a checkout clearing the cart also moves
    /// the cart's version and collides with concurrent edits.
    pub fn clear(&self, order_id: Option<AggregateId>) -> Result<Vec<CartEvent>, CartError> {
        if !self.exists() {
            return Err(CartError::NotFound);
        }
        Ok(vec![CartEvent::cleared(order_id)])
    }
}

impl Cart {
    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// Checks that a line with `quantity` units at `unit_price` stays within
    /// the per-line cap and that the resulting cart total fits.
    fn check_line(
        &self,
        product_id: &ProductId,
        quantity: u32,
        unit_price: Money,
    ) -> Result<(), CartError> {
        if quantity > LineItem::MAX_QUANTITY {
            return Err(CartError::QuantityTooLarge {
                quantity,
                max: LineItem::MAX_QUANTITY,
            });
        }

        let line = unit_price
            .checked_multiply(quantity)
            .ok_or(CartError::TotalTooLarge)?;
        self.items
            .iter()
            .filter(|item| &item.product_id != product_id)
            .try_fold(line, |total, item| {
                item.checked_total_price()
                    .and_then(|price| total.checked_add(price))
            })
            .map(|_| ())
            .ok_or(CartError::TotalTooLarge)
    }
}
