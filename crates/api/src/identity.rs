//! Caller identity from gateway headers.
//!
//! Authentication happens upstream; the gateway forwards the user id, role
//! and optionally the email address as headers.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use domain::CustomerId;
use event_store::EventStore;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: CustomerId,
    pub is_admin: bool,
    pub email: Option<String>,
}

impl Identity {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let user_id = header(USER_ID_HEADER)
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .map(CustomerId::from_uuid)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        Ok(Self {
            user_id,
            is_admin: header(USER_ROLE_HEADER).is_some_and(|r| r.eq_ignore_ascii_case("admin")),
            email: header(USER_EMAIL_HEADER).map(String::from),
        })
    }
}

/// Resolves the caller and stores the [`Identity`] in request extensions.
///
/// A forwarded email address is recorded so order emails can reach the user.
pub async fn authenticate<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = Identity::from_headers(req.headers())?;
    if let Some(email) = &identity.email {
        state.directory.register(identity.user_id, email.clone()).await;
    }
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Rejects callers without the admin role. Runs after [`authenticate`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let is_admin = req
        .extensions()
        .get::<Identity>()
        .is_some_and(|identity| identity.is_admin);
    if !is_admin {
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }
    Ok(next.run(req).await)
}
