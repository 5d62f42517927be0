use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::image::ImageKind;
use crate::models::job::{JobKind, JobStatus};

/// Response after a job has been processed.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateJobResponse {
    pub ok: bool,
    pub job_id: Uuid,
}

/// One variant entry in a job listing.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ImageEntry {
    pub pk: Uuid,
    pub kind: ImageKind,
    pub width: u32,
    pub height: u32,
}

/// Response for `GET /api/job/{id}/`.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobDetailResponse {
    pub ok: bool,
    pub pk: Uuid,
    pub kind: JobKind,
    pub status: JobStatus,
    pub images: Vec<ImageEntry>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct JobSummary {
    pub pk: Uuid,
    pub kind: JobKind,
    pub status: JobStatus,
}

/// Response for `GET /api/job/`.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobListResponse {
    pub ok: bool,
    pub jobs: Vec<JobSummary>,
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
}
