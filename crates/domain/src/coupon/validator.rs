//! Coupon eligibility rules.
//!
//! The same evaluation backs the cart preview and checkout, so a coupon the
//! preview accepts is priced identically when the order is placed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::Money;
use crate::aggregate::Aggregate;
use crate::cart::Cart;

use super::Coupon;

/// Pricing of a cart once a coupon is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    /// The applied coupon's normalized code.
    pub code: String,
    pub original: Money,
    pub discount: Money,
    pub final_total: Money,
}

/// Why a coupon does not apply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponRejection {
    #[error("Invalid coupon code")]
    NotFound,

    #[error("This coupon is not active")]
    Inactive,

    #[error("This coupon has expired or is not yet valid")]
    Expired,

    #[error("This coupon has reached its usage limit")]
    LimitReached,

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Minimum order value of {minimum} is required to use this coupon")]
    MinimumNotMet { minimum: Money },
}

/// Evaluates `coupon` against `cart` at `now`.
///
/// Rules run in a fixed order and the first failure wins: existence,
/// active flag, validity window (inclusive), remaining uses, non-empty
/// cart, minimum order value.
pub fn validate(coupon: &Coupon, cart: &Cart, now: DateTime<Utc>) -> Result<Quote, CouponRejection> {
    if !coupon.exists() {
        return Err(CouponRejection::NotFound);
    }
    if !coupon.is_active() {
        return Err(CouponRejection::Inactive);
    }
    if !coupon.is_valid_at(now) {
        return Err(CouponRejection::Expired);
    }
    if !coupon.has_uses_left() {
        return Err(CouponRejection::LimitReached);
    }
    if cart.is_empty() {
        return Err(CouponRejection::EmptyCart);
    }

    let original = cart.total();
    if original < coupon.min_order_value() {
        return Err(CouponRejection::MinimumNotMet {
            minimum: coupon.min_order_value(),
        });
    }

    let discount = coupon.discount().amount_off(original);
    Ok(Quote {
        code: coupon.code().to_string(),
        original,
        discount,
        final_total: original - discount,
    })
}
