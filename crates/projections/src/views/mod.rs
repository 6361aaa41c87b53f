//! Read model views for the query side.

pub mod coupons;
pub mod order_summaries;

pub use coupons::{CouponSummary, CouponsView};
pub use order_summaries::{OrderSummariesView, OrderSummary};
