//! Cart endpoints for the signed-in customer.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, State};
use domain::ProductId;
use event_store::EventStore;

use crate::dto::{AddToCartRequest, CartResponse, UpdateCartRequest};
use crate::error::ApiError;
use crate::identity::Identity;
use crate::response::ApiResponse;
use crate::state::AppState;

type CartResult = Result<ApiResponse<CartResponse>, ApiError>;

/// GET /cart
#[tracing::instrument(skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
) -> CartResult {
    let cart = state.carts.get_cart(identity.user_id).await?;
    Ok(ApiResponse::ok(
        CartResponse::from(&cart),
        "Cart retrieved successfully",
    ))
}

/// POST /cart/add
#[tracing::instrument(skip(state, identity, payload), fields(user_id = %identity.user_id))]
pub async fn add<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<AddToCartRequest>, JsonRejection>,
) -> CartResult {
    let Json(req) = payload?;
    let cart = state
        .carts
        .add_item(identity.user_id, &ProductId::new(req.product_id), req.quantity)
        .await?;
    Ok(ApiResponse::ok(CartResponse::from(&cart), "Item added to cart"))
}

/// PUT /cart/update
#[tracing::instrument(skip(state, identity, payload), fields(user_id = %identity.user_id))]
pub async fn update<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<UpdateCartRequest>, JsonRejection>,
) -> CartResult {
    let Json(req) = payload?;
    let cart = state
        .carts
        .set_quantity(identity.user_id, &ProductId::new(req.product_id), req.quantity)
        .await?;
    Ok(ApiResponse::ok(CartResponse::from(&cart), "Cart updated"))
}

/// DELETE /cart/remove/{productId}
#[tracing::instrument(skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn remove<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    Path(product_id): Path<String>,
) -> CartResult {
    let cart = state
        .carts
        .remove_item(identity.user_id, &ProductId::new(product_id))
        .await?;
    Ok(ApiResponse::ok(
        CartResponse::from(&cart),
        "Item removed from cart",
    ))
}
