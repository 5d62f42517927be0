use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::services::auth::{token_from_header, Principal};

/// Resolves the caller from the `Authorization` header.
///
/// Runs before any body extractor, so unauthenticated uploads are rejected
/// without reading the payload.
impl FromRequestParts<AppState> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(ApiError::Unauthorized("Authorization header not provided."))?
            .to_str()
            .map_err(|_| ApiError::Unauthorized("Invalid token."))?;

        let token = token_from_header(header).ok_or(ApiError::Unauthorized("Invalid token."))?;

        state.tokens.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            ApiError::Unauthorized("Invalid token.")
        })
    }
}
