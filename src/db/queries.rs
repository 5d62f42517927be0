use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{JobRepository, RepositoryError};
use crate::models::image::{ImageKind, ImageRecord};
use crate::models::job::{Job, JobKind, JobStatus};

/// PostgreSQL-backed repository.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn job_from_row(row: &PgRow) -> Result<Job, RepositoryError> {
    let kind: String = row.try_get("kind")?;
    let status: String = row.try_get("status")?;
    Ok(Job {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        kind: JobKind::from_str(&kind)
            .map_err(|_| RepositoryError::Corrupt(format!("unknown job kind {kind:?}")))?,
        status: JobStatus::from_str(&status)
            .map_err(|_| RepositoryError::Corrupt(format!("unknown job status {status:?}")))?,
        created_at: row.try_get("created_at")?,
    })
}

fn image_from_row(row: &PgRow) -> Result<ImageRecord, RepositoryError> {
    let kind: String = row.try_get("kind")?;
    let width: i32 = row.try_get("width")?;
    let height: i32 = row.try_get("height")?;
    Ok(ImageRecord {
        id: row.try_get("id")?,
        job_id: row.try_get("job_id")?,
        kind: ImageKind::from_str(&kind)
            .map_err(|_| RepositoryError::Corrupt(format!("unknown image kind {kind:?}")))?,
        storage_key: row.try_get("storage_key")?,
        content_type: row.try_get("content_type")?,
        width: u32::try_from(width)
            .map_err(|_| RepositoryError::Corrupt(format!("negative width {width}")))?,
        height: u32::try_from(height)
            .map_err(|_| RepositoryError::Corrupt(format!("negative height {height}")))?,
        size_bytes: row.try_get("size_bytes")?,
        created_at: row.try_get("created_at")?,
    })
}

fn dimension(value: u32) -> Result<i32, RepositoryError> {
    i32::try_from(value).map_err(|_| RepositoryError::Corrupt(format!("dimension {value} too large")))
}

#[async_trait]
impl JobRepository for PgRepository {
    async fn create_job(&self, job: &Job) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO image_jobs (id, owner_id, kind, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(job.id)
        .bind(&job.owner_id)
        .bind(job.kind.to_string())
        .bind(job.status.to_string())
        .bind(job.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<Job>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, kind, status, created_at
            FROM image_jobs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(job_from_row).transpose()
    }

    async fn jobs_for_owner(&self, owner_id: &str) -> Result<Vec<Job>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, kind, status, created_at
            FROM image_jobs
            WHERE owner_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(job_from_row).collect()
    }

    async fn set_status(&self, id: Uuid, status: JobStatus) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE image_jobs SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::UnknownJob(id));
        }
        Ok(())
    }

    async fn delete_job(&self, id: Uuid) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM image_jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn create_image(&self, image: &ImageRecord) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO job_images
                (id, job_id, kind, storage_key, content_type, width, height, size_bytes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(image.id)
        .bind(image.job_id)
        .bind(image.kind.to_string())
        .bind(&image.storage_key)
        .bind(&image.content_type)
        .bind(dimension(image.width)?)
        .bind(dimension(image.height)?)
        .bind(image.size_bytes)
        .bind(image.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                Err(RepositoryError::UnknownJob(image.job_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_image(&self, id: Uuid) -> Result<Option<ImageRecord>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, job_id, kind, storage_key, content_type, width, height, size_bytes, created_at
            FROM job_images
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(image_from_row).transpose()
    }

    async fn list_images(&self, job_id: Uuid) -> Result<Vec<ImageRecord>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, job_id, kind, storage_key, content_type, width, height, size_bytes, created_at
            FROM job_images
            WHERE job_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(image_from_row).collect()
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
