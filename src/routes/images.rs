use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::routes::jobs::parse_id;
use crate::services::auth::Principal;

/// GET /api/image/{id}/: raw bytes of a stored variant.
pub async fn get_image(
    State(state): State<AppState>,
    owner: Principal,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let (bytes, content_type) = state.jobs.get_image_bytes(parse_id(&id)?, &owner).await?;

    Ok(([(CONTENT_TYPE, content_type)], bytes).into_response())
}
