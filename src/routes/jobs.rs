use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::Json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::api::{CreateJobResponse, ImageEntry, JobDetailResponse, JobListResponse, JobSummary};
use crate::services::auth::Principal;
use crate::services::jobs::{JobError, Upload};
use crate::services::variants;

/// Ids that do not parse can never name a stored record.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::Job(JobError::NotFound))
}

/// Fields of a job upload; either may be absent.
#[derive(Debug, Default)]
struct JobForm {
    file: Option<Upload>,
    kind: Option<String>,
}

async fn read_job_form(mut multipart: Multipart) -> Result<JobForm, ApiError> {
    let mut form = JobForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                form.file = Some(Upload {
                    bytes: data.to_vec(),
                    content_type,
                });
            }
            Some("kind") => form.kind = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(form)
}

/// POST /api/job/: upload an image and produce the variants for `kind`.
pub async fn create_job(
    State(state): State<AppState>,
    owner: Principal,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<CreateJobResponse>, ApiError> {
    // A body that is not multipart at all carries neither field.
    let form = match multipart {
        Ok(multipart) => read_job_form(multipart).await?,
        Err(_) => JobForm::default(),
    };

    let mut missing = Vec::new();
    if form.file.is_none() {
        missing.push("Missing file");
    }
    if form.kind.is_none() {
        missing.push("Missing kind");
    }
    let (Some(file), Some(kind)) = (form.file, form.kind) else {
        return Err(ApiError::Validation(missing.join("\n")));
    };

    let kind = variants::parse_kind(&kind)?;
    let outcome = state.jobs.create_job(&owner, file, kind).await?;

    Ok(Json(CreateJobResponse {
        ok: true,
        job_id: outcome.job.id,
    }))
}

/// GET /api/job/: the caller's jobs, oldest first.
pub async fn list_jobs(
    State(state): State<AppState>,
    owner: Principal,
) -> Result<Json<JobListResponse>, ApiError> {
    let jobs = state.jobs.list_jobs(&owner).await?;

    Ok(Json(JobListResponse {
        ok: true,
        jobs: jobs
            .into_iter()
            .map(|job| JobSummary {
                pk: job.id,
                kind: job.kind,
                status: job.status,
            })
            .collect(),
    }))
}

/// GET /api/job/{id}/: job metadata and its variant list.
pub async fn get_job(
    State(state): State<AppState>,
    owner: Principal,
    Path(id): Path<String>,
) -> Result<Json<JobDetailResponse>, ApiError> {
    let outcome = state.jobs.get_job(parse_id(&id)?, &owner).await?;

    Ok(Json(JobDetailResponse {
        ok: true,
        pk: outcome.job.id,
        kind: outcome.job.kind,
        status: outcome.job.status,
        images: outcome
            .images
            .into_iter()
            .map(|image| ImageEntry {
                pk: image.id,
                kind: image.kind,
                width: image.width,
                height: image.height,
            })
            .collect(),
    }))
}
