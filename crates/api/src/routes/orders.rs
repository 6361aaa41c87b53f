//! Checkout, order reads, payment callbacks and fulfillment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, State};
use checkout::PaymentOutcome;
use domain::AddressId;
use event_store::EventStore;
use uuid::Uuid;

use super::parse_order_id;
use crate::dto::{
    CheckoutRequest, DeclineRequest, OrderListItem, OrderResponse, ShipOrderRequest,
    ShipOrderResponse, ShipmentResponse, UpdateStatusRequest,
};
use crate::error::ApiError;
use crate::identity::Identity;
use crate::response::ApiResponse;
use crate::state::AppState;

/// POST /orders/checkout: turns the caller's cart into an order with a pending payment.
#[tracing::instrument(skip(state, identity, payload), fields(user_id = %identity.user_id))]
pub async fn checkout<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<ApiResponse<OrderResponse>, ApiError> {
    let Json(req) = payload?;

    let address_id = match req.address_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            Uuid::parse_str(raw)
                .map(AddressId::from_uuid)
                .map_err(|_| ApiError::BadRequest("Invalid address ID".to_string()))?,
        ),
    };

    let order = state
        .checkout
        .checkout(identity.user_id, address_id, req.coupon_code.as_deref())
        .await?;

    Ok(ApiResponse::created(
        OrderResponse::from(&order),
        "Order placed successfully",
    ))
}

/// GET /orders: the caller's orders, newest first.
#[tracing::instrument(skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn list_mine<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
) -> Result<ApiResponse<Vec<OrderListItem>>, ApiError> {
    // Catch up so the caller sees orders they just placed
    state.projection_processor.run_catch_up().await?;

    let orders = state
        .order_summaries
        .for_customer(identity.user_id)
        .await
        .into_iter()
        .map(OrderListItem::from)
        .collect();
    Ok(ApiResponse::ok(orders, "Orders retrieved successfully"))
}

/// GET /orders/{orderId}
#[tracing::instrument(skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<ApiResponse<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.orders.get_order(identity.user_id, order_id).await?;
    Ok(ApiResponse::ok(
        OrderResponse::from(&order),
        "Order retrieved successfully",
    ))
}

/// POST /orders/payment/verify/{orderId}: the gateway reports a captured payment.
#[tracing::instrument(skip(state))]
pub async fn verify_payment<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<PaymentOutcome>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let outcome = state.confirmations.confirm(order_id).await?;
    Ok(ApiResponse::ok(outcome, "Payment verified successfully"))
}

/// POST /orders/payment/decline/{orderId}: the gateway reports a declined payment.
///
/// The body is optional; without a reason a generic one is recorded.
#[tracing::instrument(skip(state, body))]
pub async fn decline_payment<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<ApiResponse<PaymentOutcome>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let req: DeclineRequest = if body.iter().all(u8::is_ascii_whitespace) {
        DeclineRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))?
    };

    let outcome = state
        .confirmations
        .decline(order_id, req.reason.as_deref().unwrap_or_default())
        .await?;
    Ok(ApiResponse::ok(outcome, "Payment declined"))
}

/// GET /orders/admin/all
#[tracing::instrument(skip(state))]
pub async fn list_all<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<ApiResponse<Vec<OrderListItem>>, ApiError> {
    state.projection_processor.run_catch_up().await?;

    let orders = state
        .order_summaries
        .all()
        .await
        .into_iter()
        .map(OrderListItem::from)
        .collect();
    Ok(ApiResponse::ok(orders, "All orders retrieved successfully"))
}

/// POST /orders/admin/ship/{orderId}
#[tracing::instrument(skip(state, payload))]
pub async fn ship<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<ShipOrderRequest>, JsonRejection>,
) -> Result<ApiResponse<ShipOrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let Json(req) = payload?;

    let (order, shipment) = state
        .shipments
        .create_shipment(order_id, &req.carrier, &req.tracking_number)
        .await?;

    Ok(ApiResponse::created(
        ShipOrderResponse {
            order: OrderResponse::from(&order),
            shipment: ShipmentResponse::from(&shipment),
        },
        "Order shipped successfully",
    ))
}

/// PATCH /orders/admin/status/{orderId}
#[tracing::instrument(skip(state, payload))]
pub async fn update_status<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<ApiResponse<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let Json(req) = payload?;

    let order = state.orders.update_status(order_id, &req.status).await?;
    Ok(ApiResponse::ok(
        OrderResponse::from(&order),
        "Order status updated",
    ))
}
