use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::models::api::ErrorBody;
use crate::services::compositor::CompositorError;
use crate::services::jobs::JobError;
use crate::services::variants::InvalidKindError;

/// Every failure an API handler can report.
///
/// Responses carry a status code and a short `error` message; internal
/// details only go to the log.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Not valid job kind.")]
    InvalidKind(#[from] InvalidKindError),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Could not read upload: {}", .0.body_text())]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Job(#[from] JobError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidKind(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Multipart(e) => e.status(),
            ApiError::Job(e) => match e {
                JobError::Image(CompositorError::Decode(_) | CompositorError::TooLarge { .. }) => {
                    StatusCode::BAD_REQUEST
                }
                JobError::NotFound => StatusCode::NOT_FOUND,
                JobError::Forbidden => StatusCode::FORBIDDEN,
                JobError::Image(CompositorError::Encode(_))
                | JobError::Repository(_)
                | JobError::Storage(_)
                | JobError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Job(JobError::Image(CompositorError::Decode(_))) => {
                "Uploaded file is not a decodable image.".to_string()
            }
            ApiError::Job(JobError::Image(CompositorError::TooLarge { .. })) => {
                "Image dimensions are too large to process.".to_string()
            }
            ApiError::Job(JobError::Image(CompositorError::Encode(_))) => {
                "Could not process image.".to_string()
            }
            ApiError::Job(JobError::Repository(_) | JobError::Task(_)) => {
                "Could not save job.".to_string()
            }
            ApiError::Job(JobError::Storage(_)) => "Could not store image.".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = ErrorBody {
            ok: false,
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
