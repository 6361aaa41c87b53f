//! Discount coupons and the rules deciding whether one applies to a cart.

mod aggregate;
mod events;
mod validator;

pub use aggregate::{Coupon, Discount, NewCoupon, normalize_code};
pub use events::{CouponCreatedData, CouponEvent, CouponRedeemedData};
pub use validator::{CouponRejection, Quote, validate};

use thiserror::Error;

/// Errors that can occur during coupon operations.
#[derive(Debug, Error)]
pub enum CouponError {
    /// A coupon with this code already exists.
    #[error("Coupon with this code already exists: {code}")]
    AlreadyExists { code: String },

    /// No coupon exists with this code.
    #[error("Coupon not found")]
    NotFound,

    /// Code is required.
    #[error("Coupon code is required")]
    MissingCode,

    /// Percentage discounts are capped at 100.
    #[error("Invalid percentage: {percent} (must be between 0 and 100)")]
    InvalidPercentage { percent: u32 },

    /// Amounts cannot be negative.
    #[error("Invalid amount: {cents} cents (must not be negative)")]
    InvalidAmount { cents: i64 },

    /// The validity window ends before it starts.
    #[error("Coupon validity window ends before it starts")]
    InvalidWindow,

    /// A coupon must be usable at least once.
    #[error("Usage limit must be at least 1")]
    InvalidUsageLimit,

    /// Every use has been consumed.
    #[error("Coupon {code} has reached its usage limit")]
    LimitReached { code: String },
}
