//! Checkout error taxonomy.
//!
//! Every failure a caller can see falls in one of five categories. Domain
//! errors are classified on conversion; storage errors stay internal until
//! [`CheckoutError::surface`] turns them into a generic "try again" failure.

use domain::{
    CartError, CouponError, CouponRejection, DomainError, OrderError, PaymentError, ProductError,
    ShipmentError,
};
use thiserror::Error;

/// Errors returned by the checkout services.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Missing or invalid input.
    #[error("{0}")]
    Validation(String),

    /// The target does not exist or is not owned by the caller.
    #[error("{0}")]
    NotFound(String),

    /// The request collides with existing state.
    #[error("{0}")]
    Conflict(String),

    /// The target is in the wrong state for the request.
    #[error("{0}")]
    State(String),

    /// The write could not be committed. The cause has been logged.
    #[error("Unable to {action}. Please try again.")]
    Transaction { action: &'static str },

    /// A storage failure not yet surfaced to the caller.
    #[error("Storage error: {0}")]
    Store(DomainError),
}

impl CheckoutError {
    /// Returns true if the operation may succeed when re-run from a fresh read.
    pub fn is_conflict(&self) -> bool {
        matches!(self, CheckoutError::Store(e) if e.is_conflict())
    }

    /// Replaces a storage failure with a [`CheckoutError::Transaction`] for
    /// `action`, logging the cause. Other errors pass through.
    pub fn surface(self, action: &'static str) -> Self {
        match self {
            CheckoutError::Store(cause) => {
                tracing::error!(action, error = %cause, "storage failure");
                CheckoutError::Transaction { action }
            }
            other => other,
        }
    }
}

impl From<DomainError> for CheckoutError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Cart(e) => e.into(),
            DomainError::Coupon(e) => e.into(),
            DomainError::Product(e) => e.into(),
            DomainError::Order(e) => e.into(),
            DomainError::Payment(e) => e.into(),
            DomainError::Shipment(e) => e.into(),
            other => CheckoutError::Store(other),
        }
    }
}

impl From<CartError> for CheckoutError {
    fn from(err: CartError) -> Self {
        let message = err.to_string();
        match err {
            CartError::InvalidQuantity { .. }
            | CartError::QuantityTooLarge { .. }
            | CartError::TotalTooLarge => CheckoutError::Validation(message),
            CartError::NotFound | CartError::ItemNotFound { .. } => {
                CheckoutError::NotFound(message)
            }
        }
    }
}

impl From<CouponError> for CheckoutError {
    fn from(err: CouponError) -> Self {
        match err {
            CouponError::AlreadyExists { .. } => {
                CheckoutError::Conflict("Coupon with this code already exists.".to_string())
            }
            CouponError::NotFound => CheckoutError::NotFound("Invalid coupon code.".to_string()),
            CouponError::LimitReached { .. } => CheckoutError::Conflict(
                "This coupon has reached its usage limit.".to_string(),
            ),
            other => CheckoutError::Validation(other.to_string()),
        }
    }
}

impl From<CouponRejection> for CheckoutError {
    fn from(rejection: CouponRejection) -> Self {
        let message = format!("{rejection}.");
        match rejection {
            CouponRejection::NotFound => CheckoutError::NotFound(message),
            CouponRejection::LimitReached => CheckoutError::Conflict(message),
            _ => CheckoutError::Validation(message),
        }
    }
}

impl From<ProductError> for CheckoutError {
    fn from(err: ProductError) -> Self {
        let message = err.to_string();
        match err {
            ProductError::NotListed => CheckoutError::NotFound(message),
            ProductError::AlreadyListed { .. } | ProductError::InsufficientStock { .. } => {
                CheckoutError::Conflict(message)
            }
            _ => CheckoutError::Validation(message),
        }
    }
}

impl From<OrderError> for CheckoutError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::NotFound => CheckoutError::NotFound(message),
            OrderError::AlreadyPlaced | OrderError::AlreadyPaid | OrderError::ShipmentExists => {
                CheckoutError::Conflict(message)
            }
            OrderError::NoItems
            | OrderError::InvalidDiscount { .. }
            | OrderError::InvalidTargetStatus { .. } => CheckoutError::Validation(message),
            OrderError::PaymentNotPending { .. }
            | OrderError::InvalidTransition { .. }
            | OrderError::CannotShip { .. }
            | OrderError::PaymentIncomplete { .. }
            | OrderError::ShipmentRequired => CheckoutError::State(message),
        }
    }
}

impl From<PaymentError> for CheckoutError {
    fn from(err: PaymentError) -> Self {
        let message = err.to_string();
        match err {
            PaymentError::NotFound => CheckoutError::NotFound(message),
            PaymentError::AlreadyInitiated | PaymentError::AlreadySettled { .. } => {
                CheckoutError::Conflict(message)
            }
            PaymentError::InvalidAmount { .. } => CheckoutError::Validation(message),
        }
    }
}

impl From<ShipmentError> for CheckoutError {
    fn from(err: ShipmentError) -> Self {
        let message = err.to_string();
        match err {
            ShipmentError::TrackingNumberTaken { .. } => CheckoutError::Conflict(message),
            ShipmentError::MissingCarrier | ShipmentError::MissingTrackingNumber => {
                CheckoutError::Validation(message)
            }
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
