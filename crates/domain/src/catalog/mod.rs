//! Product catalog.
//!
//! Only what checkout needs: listing a product, restocking it and the stock
//! decrement applied when a payment is confirmed.

mod aggregate;
mod events;

pub use aggregate::Product;
pub use events::{
    ProductDeactivatedData, ProductEvent, ProductListedData, ProductRestockedData,
    StockDecrementedData,
};

use thiserror::Error;

use crate::ProductId;

/// Errors that can occur during product operations.
#[derive(Debug, Error)]
pub enum ProductError {
    /// A product with this SKU already exists.
    #[error("Product {sku} is already listed")]
    AlreadyListed { sku: ProductId },

    /// The product has not been listed.
    #[error("Product not found")]
    NotListed,

    /// SKU is required.
    #[error("SKU is required")]
    MissingSku,

    /// Title is required.
    #[error("Product title is required")]
    MissingTitle,

    /// Price must lie between zero and [`crate::Money::MAX_PRICE`].
    #[error("Invalid price: {price} (must be between 0 and {max})")]
    InvalidPrice { price: i64, max: i64 },

    /// Quantity must be positive.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Not enough units on hand.
    #[error("Insufficient stock for {sku}: {available} available, {requested} requested")]
    InsufficientStock {
        sku: ProductId,
        available: u32,
        requested: u32,
    },
}
