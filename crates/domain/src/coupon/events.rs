//! Coupon domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::Money;
use crate::aggregate::DomainEvent;

use super::{Discount, NewCoupon};

/// Events that can occur on a coupon aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CouponEvent {
    /// Coupon was created by an administrator.
    CouponCreated(CouponCreatedData),

    /// One use of the coupon was consumed by a checkout.
    CouponRedeemed(CouponRedeemedData),
}

impl DomainEvent for CouponEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CouponEvent::CouponCreated(_) => "CouponCreated",
            CouponEvent::CouponRedeemed(_) => "CouponRedeemed",
        }
    }
}

/// Data for CouponCreated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponCreatedData {
    pub coupon_id: AggregateId,

    /// Normalized (trimmed, upper-cased) code.
    pub code: String,
    pub discount: Discount,
    pub min_order_value: Money,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub usage_limit: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Data for CouponRedeemed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponRedeemedData {
    pub order_id: AggregateId,
    pub discount: Money,
    pub redeemed_at: DateTime<Utc>,
}

impl CouponEvent {
    /// Creates a CouponCreated event from already validated input.
    pub fn created(coupon_id: AggregateId, code: String, coupon: &NewCoupon) -> Self {
        CouponEvent::CouponCreated(CouponCreatedData {
            coupon_id,
            code,
            discount: coupon.discount,
            min_order_value: coupon.min_order_value,
            valid_from: coupon.valid_from,
            valid_to: coupon.valid_to,
            usage_limit: coupon.usage_limit,
            is_active: coupon.is_active,
            created_at: Utc::now(),
        })
    }

    /// Creates a CouponRedeemed event.
    pub fn redeemed(order_id: AggregateId, discount: Money) -> Self {
        CouponEvent::CouponRedeemed(CouponRedeemedData {
            order_id,
            discount,
            redeemed_at: Utc::now(),
        })
    }
}
