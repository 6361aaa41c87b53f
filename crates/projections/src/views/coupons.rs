//! Coupons read model: the admin listing with usage counts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{CouponEvent, Discount, Money};
use event_store::EventEnvelope;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::{ProjectionError, Result};
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// A coupon as listed to administrators.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponSummary {
    pub coupon_id: AggregateId,
    pub code: String,
    pub discount: Discount,
    pub min_order_value: Money,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub usage_limit: u32,
    pub times_used: u32,
    pub is_active: bool,

    /// Total discount granted across all redemptions.
    pub discount_granted: Money,

    pub created_at: DateTime<Utc>,
}

struct CouponsState {
    coupons: HashMap<AggregateId, CouponSummary>,
    position: ProjectionPosition,
}

/// Read model view of every coupon.
#[derive(Clone)]
pub struct CouponsView {
    state: Arc<RwLock<CouponsState>>,
}

impl CouponsView {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(CouponsState {
                coupons: HashMap::new(),
                position: ProjectionPosition::zero(),
            })),
        }
    }

    /// Looks up a coupon by its normalized code.
    pub async fn get_by_code(&self, code: &str) -> Option<CouponSummary> {
        let code = domain::normalize_code(code);
        self.state
            .read()
            .await
            .coupons
            .values()
            .find(|c| c.code == code)
            .cloned()
    }

    /// Every coupon, most recently created first.
    pub async fn all(&self) -> Vec<CouponSummary> {
        let state = self.state.read().await;
        let mut coupons: Vec<_> = state.coupons.values().cloned().collect();
        coupons.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.code.cmp(&b.code))
        });
        coupons
    }
}

impl Default for CouponsView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for CouponsView {
    fn name(&self) -> &'static str {
        "CouponsView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type != "Coupon" {
            let mut state = self.state.write().await;
            state.position = state.position.advance();
            return Ok(());
        }

        let coupon_event: CouponEvent = serde_json::from_value(event.payload.clone())?;
        let mut state = self.state.write().await;

        match coupon_event {
            CouponEvent::CouponCreated(data) => {
                state.coupons.insert(
                    event.aggregate_id,
                    CouponSummary {
                        coupon_id: data.coupon_id,
                        code: data.code,
                        discount: data.discount,
                        min_order_value: data.min_order_value,
                        valid_from: data.valid_from,
                        valid_to: data.valid_to,
                        usage_limit: data.usage_limit,
                        times_used: 0,
                        is_active: data.is_active,
                        discount_granted: Money::zero(),
                        created_at: data.created_at,
                    },
                );
            }
            CouponEvent::CouponRedeemed(data) => {
                let coupon = state.coupons.get_mut(&event.aggregate_id).ok_or(
                    ProjectionError::UnknownAggregate {
                        projection: "CouponsView",
                        aggregate_id: event.aggregate_id,
                    },
                )?;
                coupon.times_used += 1;
                coupon.discount_granted += data.discount;
            }
        }

        state.position = state.position.advance();
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.coupons.clear();
        state.position = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for CouponsView {
    fn name(&self) -> &'static str {
        "CouponsView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.coupons.len()).unwrap_or(0)
    }
}
