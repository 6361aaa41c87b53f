//! Coupon preview and administration endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use domain::{Money, NewCoupon};
use event_store::EventStore;

use crate::dto::{ApplyCouponRequest, CouponResponse, CreateCouponRequest, QuoteResponse};
use crate::error::ApiError;
use crate::identity::Identity;
use crate::response::ApiResponse;
use crate::state::AppState;

/// POST /coupons/apply: prices the caller's cart with a coupon without redeeming it.
#[tracing::instrument(skip(state, identity, payload), fields(user_id = %identity.user_id))]
pub async fn apply<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<ApplyCouponRequest>, JsonRejection>,
) -> Result<ApiResponse<QuoteResponse>, ApiError> {
    let Json(req) = payload?;
    let quote = state.coupons.apply(identity.user_id, &req.coupon_code).await?;
    Ok(ApiResponse::ok(
        QuoteResponse::from(quote),
        "Coupon applied successfully",
    ))
}

/// POST /coupons/admin/create
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateCouponRequest>, JsonRejection>,
) -> Result<ApiResponse<CouponResponse>, ApiError> {
    let Json(req) = payload?;
    let coupon = NewCoupon {
        discount: req.discount()?,
        code: req.code,
        min_order_value: Money::from_cents(req.min_order_value_cents),
        valid_from: req.valid_from,
        valid_to: req.valid_to,
        usage_limit: req.usage_limit,
        is_active: req.is_active,
    };
    let coupon = state.coupons.create(coupon).await?;
    Ok(ApiResponse::created(
        CouponResponse::from(&coupon),
        "Coupon created successfully",
    ))
}

/// GET /coupons/admin/all
#[tracing::instrument(skip(state))]
pub async fn all<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<ApiResponse<Vec<CouponResponse>>, ApiError> {
    state.projection_processor.run_catch_up().await?;

    let coupons = state
        .coupon_summaries
        .all()
        .await
        .into_iter()
        .map(CouponResponse::from)
        .collect();
    Ok(ApiResponse::ok(coupons, "Coupons retrieved successfully"))
}
