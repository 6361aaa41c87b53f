//! Cart operations.

use domain::{
    Aggregate, Cart, CartError, CartEvent, CustomerId, Product, ProductId, UnitOfWork,
    load_aggregate,
};
use event_store::EventStore;

use crate::error::{CheckoutError, Result};
use crate::retry::RetryPolicy;

/// Reads and edits customers' carts.
///
/// Every write goes against the cart version it was read at; a concurrent
/// edit makes the loser re-run from a fresh read.
pub struct CartService<S: EventStore> {
    store: S,
    retry: RetryPolicy,
}

impl<S: EventStore> CartService<S> {
    pub fn new(store: S, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Returns the customer's cart, creating an empty one on first access.
    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self, customer_id: CustomerId) -> Result<Cart> {
        self.retry
            .run("load cart", || async move { self.try_get_cart(customer_id).await })
            .await
    }

    /// Adds units of a product at its current price.
    ///
    /// The stock check only looks at the units on hand right now; stock is
    /// taken when the order is paid.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        customer_id: CustomerId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        if product_id.as_str().trim().is_empty() {
            return Err(CheckoutError::Validation(
                "Product ID is required".to_string(),
            ));
        }
        if quantity == 0 {
            return Err(CheckoutError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }

        self.retry
            .run("update cart", || async move {
                self.try_add_item(customer_id, product_id, quantity).await
            })
            .await
    }

    /// Replaces the quantity of a line already in the cart.
    #[tracing::instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        customer_id: CustomerId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        if product_id.as_str().trim().is_empty() || quantity == 0 {
            return Err(CheckoutError::Validation(
                "Product ID and a valid quantity are required".to_string(),
            ));
        }

        self.retry
            .run("update cart", || async move {
                self.edit(customer_id, |cart| {
                    cart.set_quantity(product_id.clone(), quantity)
                })
                .await
            })
            .await
    }

    /// Removes a line. Removing a product that is not in the cart changes nothing.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, customer_id: CustomerId, product_id: &ProductId) -> Result<Cart> {
        self.retry
            .run("update cart", || async move {
                self.edit(customer_id, |cart| cart.remove_item(product_id.clone()))
                    .await
            })
            .await
    }

    /// Empties the cart.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, customer_id: CustomerId) -> Result<Cart> {
        self.retry
            .run("update cart", || async move {
                self.edit(customer_id, |cart| cart.clear(None)).await
            })
            .await
    }

    async fn try_get_cart(&self, customer_id: CustomerId) -> Result<Cart> {
        let cart_id = Cart::id_for(customer_id);
        let mut uow = UnitOfWork::begin(&self.store);
        let mut cart: Cart = uow.load(cart_id).await?;
        if cart.exists() {
            return Ok(cart);
        }

        uow.execute(cart_id, &mut cart, |c| c.open(cart_id, customer_id))?;
        uow.commit().await?;
        tracing::debug!(%customer_id, "cart created");
        Ok(cart)
    }

    async fn try_add_item(
        &self,
        customer_id: CustomerId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        let product: Product = load_aggregate(&self.store, Product::id_for(product_id)).await?;
        if !product.exists() || !product.is_active() {
            return Err(CheckoutError::NotFound("Product not found".to_string()));
        }
        if !product.has_stock(quantity) {
            return Err(CheckoutError::Validation(
                "Not enough stock available".to_string(),
            ));
        }

        let cart_id = Cart::id_for(customer_id);
        let mut uow = UnitOfWork::begin(&self.store);
        let mut cart: Cart = uow.load(cart_id).await?;
        uow.execute(cart_id, &mut cart, |c| c.open(cart_id, customer_id))?;
        uow.execute(cart_id, &mut cart, |c| {
            c.add_item(product_id.clone(), quantity, product.price())
        })?;
        uow.commit().await?;
        Ok(cart)
    }

    /// Runs a command against an existing cart and commits its events.
    async fn edit<F>(&self, customer_id: CustomerId, command: F) -> Result<Cart>
    where
        F: FnOnce(&Cart) -> std::result::Result<Vec<CartEvent>, CartError>,
    {
        let cart_id = Cart::id_for(customer_id);
        let mut uow = UnitOfWork::begin(&self.store);
        let mut cart: Cart = uow.load(cart_id).await?;
        uow.execute(cart_id, &mut cart, command)?;
        uow.commit().await?;
        Ok(cart)
    }
}
