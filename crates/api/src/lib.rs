//! HTTP API for the storefront checkout and fulfillment lifecycle.
//!
//! Customer routes act on the caller named by the gateway's identity
//! headers; admin routes additionally require the admin role. Every
//! response except health and metrics uses the `{statusCode, data, message}`
//! envelope.

pub mod config;
pub mod dto;
pub mod error;
pub mod identity;
pub mod response;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, patch, post, put};
use event_store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{Config, LogFormat};
pub use error::ApiError;
pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EventStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let public = Router::new()
        .route("/health", get(routes::health::check))
        .route("/products/{sku}", get(routes::products::get::<S>));

    let customer = Router::new()
        .route("/cart", get(routes::cart::get::<S>))
        .route("/cart/add", post(routes::cart::add::<S>))
        .route("/cart/update", put(routes::cart::update::<S>))
        .route("/cart/remove/{productId}", delete(routes::cart::remove::<S>))
        .route("/coupons/apply", post(routes::coupons::apply::<S>))
        .route("/orders", get(routes::orders::list_mine::<S>))
        .route("/orders/checkout", post(routes::orders::checkout::<S>))
        .route("/orders/{orderId}", get(routes::orders::get::<S>))
        .route(
            "/orders/payment/verify/{orderId}",
            post(routes::orders::verify_payment::<S>),
        )
        .route(
            "/orders/payment/decline/{orderId}",
            post(routes::orders::decline_payment::<S>),
        )
        .route("/addresses", post(routes::addresses::create::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            identity::authenticate::<S>,
        ));

    // Layers run outside-in: authenticate first, then the role check
    let admin = Router::new()
        .route("/coupons/admin/create", post(routes::coupons::create::<S>))
        .route("/coupons/admin/all", get(routes::coupons::all::<S>))
        .route("/orders/admin/all", get(routes::orders::list_all::<S>))
        .route("/orders/admin/ship/{orderId}", post(routes::orders::ship::<S>))
        .route(
            "/orders/admin/status/{orderId}",
            patch(routes::orders::update_status::<S>),
        )
        .route("/products/admin/create", post(routes::products::create::<S>))
        .route(
            "/products/admin/restock/{sku}",
            post(routes::products::restock::<S>),
        )
        .route_layer(middleware::from_fn(identity::require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            identity::authenticate::<S>,
        ));

    Router::new()
        .merge(public)
        .merge(customer)
        .merge(admin)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state with default configuration and log-only mail.
pub fn create_default_state<S: EventStore + Clone + 'static>(event_store: S) -> Arc<AppState<S>> {
    Arc::new(AppState::with_defaults(event_store))
}
