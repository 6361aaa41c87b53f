//! Catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use domain::{Money, ProductId};
use event_store::EventStore;

use crate::dto::{CreateProductRequest, ProductResponse, RestockRequest};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

/// POST /products/admin/create
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<ApiResponse<ProductResponse>, ApiError> {
    let Json(req) = payload?;
    let product = state
        .catalog
        .list_product(
            &ProductId::new(req.sku.trim()),
            req.title.trim(),
            Money::from_cents(req.price_cents),
            req.stock,
        )
        .await?;
    Ok(ApiResponse::created(
        ProductResponse::from(&product),
        "Product created successfully",
    ))
}

/// POST /products/admin/restock/{sku}
#[tracing::instrument(skip(state, payload))]
pub async fn restock<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(sku): Path<String>,
    payload: Result<Json<RestockRequest>, JsonRejection>,
) -> Result<ApiResponse<ProductResponse>, ApiError> {
    let Json(req) = payload?;
    let product = state
        .catalog
        .restock(&ProductId::new(sku), req.quantity)
        .await?;
    Ok(ApiResponse::ok(
        ProductResponse::from(&product),
        "Product restocked",
    ))
}

/// GET /products/{sku}
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(sku): Path<String>,
) -> Result<ApiResponse<ProductResponse>, ApiError> {
    let product = state.catalog.get_product(&ProductId::new(sku)).await?;
    Ok(ApiResponse::ok(
        ProductResponse::from(&product),
        "Product retrieved successfully",
    ))
}
