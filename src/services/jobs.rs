//! Job orchestration: turn one upload into the stored variants its kind asks for.
//!
//! Variants are produced one after another in policy order. Each one decodes
//! the upload, applies its transform, writes the bytes to the blob store and
//! then records an [`ImageRecord`]. The first failure stops the job; what is
//! left behind depends on the configured [`FailurePolicy`].

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::{JobRepository, RepositoryError};
use crate::models::image::{content_type_for_key, storage_key, ImageRecord, OutputFormat};
use crate::models::job::{Job, JobKind, JobStatus};
use crate::services::auth::Principal;
use crate::services::compositor::CompositorError;
use crate::services::storage::{BlobStore, StorageError};
use crate::services::variants::{self, Variant};

/// What happens to already-stored variants when a later one fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Remove the job, its image records and its blobs.
    #[default]
    Atomic,
    /// Keep the job, marked failed, and every variant created before the failure.
    Partial,
}

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// A fully processed job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job: Job,
    pub images: Vec<ImageRecord>,
}

pub struct JobService {
    repo: Arc<dyn JobRepository>,
    store: Arc<dyn BlobStore>,
    policy: FailurePolicy,
}

impl JobService {
    pub fn new(
        repo: Arc<dyn JobRepository>,
        store: Arc<dyn BlobStore>,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            repo,
            store,
            policy,
        }
    }

    /// Create a job for `owner` and produce every variant `kind` requires.
    pub async fn create_job(
        &self,
        owner: &Principal,
        upload: Upload,
        kind: JobKind,
    ) -> Result<JobOutcome, JobError> {
        let started = Instant::now();
        let mut job = Job::new(owner.user_id.clone(), kind);
        self.repo.create_job(&job).await?;

        metrics::counter!("image_jobs_total", "kind" => kind.to_string()).increment(1);
        info!(job_id = %job.id, owner = %job.owner_id, kind = %kind, "Job created");

        let format = OutputFormat::from_content_type(upload.content_type.as_deref());
        let source = Arc::new(upload.bytes);
        let mut images = Vec::with_capacity(variants::plan(kind).len());

        for variant in variants::plan(kind) {
            match self.produce(&job, *variant, Arc::clone(&source), format).await {
                Ok(image) => images.push(image),
                Err(e) => {
                    metrics::counter!("image_jobs_failed_total", "kind" => kind.to_string())
                        .increment(1);
                    warn!(
                        job_id = %job.id,
                        variant = %variant.kind,
                        error = %e,
                        "Variant production failed, aborting job"
                    );
                    self.abort(&job, &images).await;
                    return Err(e);
                }
            }
        }

        if let Err(e) = self.repo.set_status(job.id, JobStatus::Done).await {
            metrics::counter!("image_jobs_failed_total", "kind" => kind.to_string()).increment(1);
            warn!(job_id = %job.id, error = %e, "Could not mark job done, aborting job");
            self.abort(&job, &images).await;
            return Err(e.into());
        }
        job.status = JobStatus::Done;

        metrics::histogram!("image_job_processing_seconds")
            .record(started.elapsed().as_secs_f64());
        info!(
            job_id = %job.id,
            images = images.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Job completed"
        );

        Ok(JobOutcome { job, images })
    }

    /// Render, store and record a single variant.
    async fn produce(
        &self,
        job: &Job,
        variant: Variant,
        source: Arc<Vec<u8>>,
        format: OutputFormat,
    ) -> Result<ImageRecord, JobError> {
        let transform = variant.transform;
        let rendered =
            tokio::task::spawn_blocking(move || transform.render(&source, format)).await??;

        let image_id = Uuid::new_v4();
        let key = storage_key(job.id, image_id, format);
        self.store
            .put(&key, &rendered.bytes, format.mime_type())
            .await?;

        let record = ImageRecord {
            id: image_id,
            job_id: job.id,
            kind: variant.kind,
            storage_key: key,
            content_type: format.mime_type().to_string(),
            width: rendered.width,
            height: rendered.height,
            size_bytes: rendered.bytes.len() as i64,
            created_at: Utc::now(),
        };

        if let Err(e) = self.repo.create_image(&record).await {
            // Without a record the blob is unreachable.
            if let Err(cleanup) = self.store.delete(&record.storage_key).await {
                warn!(key = %record.storage_key, error = %cleanup, "Failed to remove orphaned blob");
            }
            return Err(e.into());
        }

        metrics::counter!("image_variants_created_total", "variant" => variant.kind.to_string())
            .increment(1);
        info!(
            job_id = %job.id,
            image_id = %record.id,
            variant = %record.kind,
            width = record.width,
            height = record.height,
            "Variant stored"
        );

        Ok(record)
    }

    /// Apply the failure policy after a variant has failed.
    ///
    /// Cleanup errors are logged; the caller still reports the original failure.
    async fn abort(&self, job: &Job, created: &[ImageRecord]) {
        match self.policy {
            FailurePolicy::Partial => {
                if let Err(e) = self.repo.set_status(job.id, JobStatus::Failed).await {
                    error!(job_id = %job.id, error = %e, "Failed to mark job failed");
                }
                if !created.is_empty() {
                    warn!(
                        job_id = %job.id,
                        kept = created.len(),
                        "Job failed; earlier variants remain stored"
                    );
                }
            }
            FailurePolicy::Atomic => {
                for image in created {
                    if let Err(e) = self.store.delete(&image.storage_key).await {
                        error!(job_id = %job.id, key = %image.storage_key, error = %e, "Failed to delete blob during rollback");
                    }
                }
                if let Err(e) = self.repo.delete_job(job.id).await {
                    error!(job_id = %job.id, error = %e, "Failed to delete job during rollback");
                } else {
                    info!(job_id = %job.id, removed = created.len(), "Job rolled back");
                }
            }
        }
    }

    /// A job and its variants, visible only to the job's owner.
    pub async fn get_job(
        &self,
        job_id: Uuid,
        requester: &Principal,
    ) -> Result<JobOutcome, JobError> {
        let job = self.repo.find_job(job_id).await?.ok_or(JobError::NotFound)?;
        if !job.is_owned_by(&requester.user_id) {
            return Err(JobError::Forbidden);
        }
        let images = self.repo.list_images(job.id).await?;
        Ok(JobOutcome { job, images })
    }

    pub async fn list_jobs(&self, requester: &Principal) -> Result<Vec<Job>, JobError> {
        Ok(self.repo.jobs_for_owner(&requester.user_id).await?)
    }

    /// Stored bytes of an image and the content type guessed from its key.
    pub async fn get_image_bytes(
        &self,
        image_id: Uuid,
        requester: &Principal,
    ) -> Result<(Vec<u8>, &'static str), JobError> {
        let image = self
            .repo
            .find_image(image_id)
            .await?
            .ok_or(JobError::NotFound)?;
        let job = self
            .repo
            .find_job(image.job_id)
            .await?
            .ok_or(JobError::NotFound)?;
        if !job.is_owned_by(&requester.user_id) {
            return Err(JobError::Forbidden);
        }

        let bytes = match self.store.get(&image.storage_key).await {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound(_)) => return Err(JobError::NotFound),
            Err(e) => return Err(e.into()),
        };
        Ok((bytes, content_type_for_key(&image.storage_key)))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Image(#[from] CompositorError),

    #[error("Could not find")]
    NotFound,

    #[error("Not allowed")]
    Forbidden,

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Image processing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
