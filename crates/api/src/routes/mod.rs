//! HTTP route handlers.

pub mod addresses;
pub mod cart;
pub mod coupons;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use common::AggregateId;
use uuid::Uuid;

use crate::error::ApiError;

fn parse_order_id(raw: &str) -> Result<AggregateId, ApiError> {
    Uuid::parse_str(raw.trim())
        .map(AggregateId::from)
        .map_err(|_| ApiError::BadRequest("Invalid order ID".to_string()))
}
