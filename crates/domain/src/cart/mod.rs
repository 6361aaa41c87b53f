//! Per-customer shopping cart.

mod aggregate;
mod events;

pub use aggregate::Cart;
pub use events::{
    CartClearedData, CartEvent, CartItemAddedData, CartItemQuantitySetData, CartItemRemovedData,
    CartOpenedData,
};

use thiserror::Error;

use crate::ProductId;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The customer has no cart yet.
    #[error("Cart not found")]
    NotFound,

    /// Quantity must be at least 1.
    #[error("Invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: u32 },

    /// A single line may not hold more than this many units.
    #[error("Invalid quantity: {quantity} (at most {max} per item)")]
    QuantityTooLarge { quantity: u32, max: u32 },

    /// The cart total would not fit in the money range.
    #[error("Cart total is too large")]
    TotalTooLarge,

    /// The product is not in the cart.
    #[error("Item not found in cart: {product_id}")]
    ItemNotFound { product_id: ProductId },
}
