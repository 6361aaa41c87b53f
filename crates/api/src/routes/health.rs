//! Liveness probe.

use axum::Json;
use serde_json::{Value, json};

/// GET /health: answers outside the response envelope so probes stay trivial.
pub async fn check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
