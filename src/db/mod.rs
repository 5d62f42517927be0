use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use uuid::Uuid;

use crate::models::image::ImageRecord;
use crate::models::job::{Job, JobStatus};

pub mod memory;
pub mod queries;

pub use memory::MemoryRepository;
pub use queries::PgRepository;

/// Initialize PostgreSQL connection pool
pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))
}

/// Persistence for jobs and their image records.
///
/// Every method is an independent write or read; nothing here spans a whole
/// job. Deleting a job removes its image records with it.
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create_job(&self, job: &Job) -> Result<(), RepositoryError>;

    async fn find_job(&self, id: Uuid) -> Result<Option<Job>, RepositoryError>;

    /// Jobs owned by `owner_id`, oldest first.
    async fn jobs_for_owner(&self, owner_id: &str) -> Result<Vec<Job>, RepositoryError>;

    async fn set_status(&self, id: Uuid, status: JobStatus) -> Result<(), RepositoryError>;

    async fn delete_job(&self, id: Uuid) -> Result<(), RepositoryError>;

    async fn create_image(&self, image: &ImageRecord) -> Result<(), RepositoryError>;

    async fn find_image(&self, id: Uuid) -> Result<Option<ImageRecord>, RepositoryError>;

    /// Images of a job in creation order.
    async fn list_images(&self, job_id: Uuid) -> Result<Vec<ImageRecord>, RepositoryError>;

    async fn ping(&self) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Job {0} does not exist")]
    UnknownJob(Uuid),

    #[error("Stored row is invalid: {0}")]
    Corrupt(String),
}
