//! Address book endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use checkout::{Address, NewAddress};
use event_store::EventStore;

use crate::dto::CreateAddressRequest;
use crate::error::ApiError;
use crate::identity::Identity;
use crate::response::ApiResponse;
use crate::state::AppState;

/// POST /addresses
#[tracing::instrument(skip(state, identity, payload), fields(user_id = %identity.user_id))]
pub async fn create<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreateAddressRequest>, JsonRejection>,
) -> Result<ApiResponse<Address>, ApiError> {
    let Json(req) = payload?;
    let address = state
        .addresses
        .add(
            identity.user_id,
            NewAddress {
                name: req.name,
                street: req.street,
                city: req.city,
                postal_code: req.postal_code,
            },
        )
        .await?;
    Ok(ApiResponse::created(address, "Address saved successfully"))
}
