//! Coupon aggregate implementation.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::Money;
use crate::aggregate::Aggregate;

use super::{CouponCreatedData, CouponError, CouponEvent};

/// How a coupon reduces the cart total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Discount {
    /// Whole-number percentage of the cart total.
    Percentage { percent: u32 },

    /// Flat amount off the cart total.
    FixedAmount { amount: Money },
}

impl Discount {
    /// Returns the discount for `total`, never more than `total` itself.
    pub fn amount_off(&self, total: Money) -> Money {
        let raw = match self {
            Discount::Percentage { percent } => total.percentage(*percent),
            Discount::FixedAmount { amount } => *amount,
        };
        raw.min(total).max(Money::zero())
    }

    /// Returns the wire name of the discount kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Discount::Percentage { .. } => "PERCENTAGE",
            Discount::FixedAmount { .. } => "FIXED_AMOUNT",
        }
    }
}

/// Input for creating a coupon.
#[derive(Debug, Clone)]
pub struct NewCoupon {
    pub code: String,
    pub discount: Discount,
    pub min_order_value: Money,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub usage_limit: u32,
    pub is_active: bool,
}

/// Trims and upper-cases a coupon code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// A discount coupon with a bounded number of uses.
///
/// Invariant: `times_used <= usage_limit`. The only events after creation
/// are redemptions, each appended against the version the coupon was read
/// at, so two checkouts cannot both take the last use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    code: String,
    discount: Discount,
    min_order_value: Money,
    valid_from: DateTime<Utc>,
    valid_to: DateTime<Utc>,
    usage_limit: u32,
    times_used: u32,
    is_active: bool,
    created_at: Option<DateTime<Utc>>,
}

impl Default for Coupon {
    fn default() -> Self {
        Self {
            id: None,
            version: Version::initial(),
            code: String::new(),
            discount: Discount::FixedAmount {
                amount: Money::zero(),
            },
            min_order_value: Money::zero(),
            valid_from: DateTime::<Utc>::MIN_UTC,
            valid_to: DateTime::<Utc>::MIN_UTC,
            usage_limit: 1,
            times_used: 0,
            is_active: false,
            created_at: None,
        }
    }
}

impl Aggregate for Coupon {
    type Event = CouponEvent;
    type Error = CouponError;

    fn aggregate_type() -> &'static str {
        "Coupon"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            CouponEvent::CouponCreated(data) => self.apply_created(data),
            CouponEvent::CouponRedeemed(_) => {
                self.times_used += 1;
            }
        }
    }
}

// Query methods
impl Coupon {
    /// Returns the stream id for a code, normalizing it first.
    pub fn id_for(code: &str) -> AggregateId {
        AggregateId::derived(Self::aggregate_type(), &normalize_code(code))
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn discount(&self) -> Discount {
        self.discount
    }

    pub fn min_order_value(&self) -> Money {
        self.min_order_value
    }

    pub fn valid_from(&self) -> DateTime<Utc> {
        self.valid_from
    }

    pub fn valid_to(&self) -> DateTime<Utc> {
        self.valid_to
    }

    pub fn usage_limit(&self) -> u32 {
        self.usage_limit
    }

    pub fn times_used(&self) -> u32 {
        self.times_used
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Returns true if `now` falls inside the validity window, both ends included.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && now <= self.valid_to
    }

    /// Returns true if at least one use remains.
    pub fn has_uses_left(&self) -> bool {
        self.times_used < self.usage_limit
    }
}

// Command methods (return events)
impl Coupon {
    /// Creates a coupon.
    pub fn create(
        &self,
        coupon_id: AggregateId,
        coupon: &NewCoupon,
    ) -> Result<Vec<CouponEvent>, CouponError> {
        let code = normalize_code(&coupon.code);

        if self.exists() {
            return Err(CouponError::AlreadyExists { code });
        }
        if code.is_empty() {
            return Err(CouponError::MissingCode);
        }
        match coupon.discount {
            Discount::Percentage { percent } if percent > 100 => {
                return Err(CouponError::InvalidPercentage { percent });
            }
            Discount::FixedAmount { amount } if amount.is_negative() => {
                return Err(CouponError::InvalidAmount {
                    cents: amount.cents(),
                });
            }
            _ => {}
        }
        if coupon.min_order_value.is_negative() {
            return Err(CouponError::InvalidAmount {
                cents: coupon.min_order_value.cents(),
            });
        }
        if coupon.valid_to < coupon.valid_from {
            return Err(CouponError::InvalidWindow);
        }
        if coupon.usage_limit == 0 {
            return Err(CouponError::InvalidUsageLimit);
        }

        Ok(vec![CouponEvent::created(coupon_id, code, coupon)])
    }

    /// Consumes one use for an order.
    pub fn redeem(
        &self,
        order_id: AggregateId,
        discount: Money,
    ) -> Result<Vec<CouponEvent>, CouponError> {
        if !self.exists() {
            return Err(CouponError::NotFound);
        }
        if !self.has_uses_left() {
            return Err(CouponError::LimitReached {
                code: self.code.clone(),
            });
        }

        Ok(vec![CouponEvent::redeemed(order_id, discount)])
    }
}

impl Coupon {
    fn apply_created(&mut self, data: CouponCreatedData) {
        self.id = Some(data.coupon_id);
        self.code = data.code;
        self.discount = data.discount;
        self.min_order_value = data.min_order_value;
        self.valid_from = data.valid_from;
        self.valid_to = data.valid_to;
        self.usage_limit = data.usage_limit;
        self.times_used = 0;
        self.is_active = data.is_active;
        self.created_at = Some(data.created_at);
    }
}
