//! Product listing and stock administration.

use domain::{CommandHandler, Money, Product, ProductId};
use event_store::EventStore;

use crate::error::{CheckoutError, Result};
use crate::retry::RetryPolicy;

/// Manages the products customers can put in their carts.
pub struct CatalogService<S: EventStore> {
    products: CommandHandler<S, Product>,
    retry: RetryPolicy,
}

impl<S: EventStore> CatalogService<S> {
    pub fn new(store: S, retry: RetryPolicy) -> Self {
        Self {
            products: CommandHandler::new(store),
            retry,
        }
    }

    /// Lists a new product under its SKU.
    #[tracing::instrument(skip(self))]
    pub async fn list_product(
        &self,
        sku: &ProductId,
        title: &str,
        price: Money,
        stock: u32,
    ) -> Result<Product> {
        let product_id = Product::id_for(sku);
        let product = self
            .retry
            .run("list product", || async move {
                let result = self
                    .products
                    .execute(product_id, |p| {
                        p.list(product_id, sku.clone(), title, price, stock)
                    })
                    .await?;
                Ok::<_, CheckoutError>(result.aggregate)
            })
            .await?;

        tracing::info!(%sku, stock, "product listed");
        Ok(product)
    }

    /// Adds units to a product's stock.
    #[tracing::instrument(skip(self))]
    pub async fn restock(&self, sku: &ProductId, quantity: u32) -> Result<Product> {
        let product_id = Product::id_for(sku);
        self.retry
            .run("restock product", || async move {
                let result = self
                    .products
                    .execute_with_snapshot(product_id, |p| p.restock(quantity))
                    .await?;
                Ok::<_, CheckoutError>(result.aggregate)
            })
            .await
    }

    /// Withdraws a product from sale. Carts can no longer take it.
    #[tracing::instrument(skip(self))]
    pub async fn deactivate(&self, sku: &ProductId) -> Result<Product> {
        let product_id = Product::id_for(sku);
        self.retry
            .run("deactivate product", || async move {
                let result = self
                    .products
                    .execute(product_id, |p| p.deactivate())
                    .await?;
                Ok::<_, CheckoutError>(result.aggregate)
            })
            .await
    }

    pub async fn get_product(&self, sku: &ProductId) -> Result<Product> {
        self.products
            .load_existing(Product::id_for(sku))
            .await?
            .ok_or_else(|| CheckoutError::NotFound("Product not found".to_string()))
    }
}
