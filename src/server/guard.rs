//! `AdminGuard` extractor. Handlers opt in with `_guard: AdminGuard`; each
//! admin request is checked on its own, there is no admin session.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;

use super::routes::{ApiError, AppState};
use crate::admin::ADMIN_HEADER;

pub struct AdminGuard;

#[async_trait]
impl FromRequestParts<AppState> for AdminGuard {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let presented = parts.headers.get(ADMIN_HEADER).and_then(|v| v.to_str().ok());
        if state.admin.is_admin(presented) {
            return Ok(AdminGuard);
        }
        tracing::warn!(
            path = %parts.uri.path(),
            header_present = presented.is_some(),
            configured = state.admin.is_configured(),
            "admin request denied"
        );
        Err(ApiError::new(StatusCode::FORBIDDEN, "Not authorized"))
    }
}
