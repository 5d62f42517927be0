use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{JobRepository, RepositoryError};
use crate::models::image::ImageRecord;
use crate::models::job::{Job, JobStatus};

#[derive(Default)]
struct State {
    jobs: HashMap<Uuid, Job>,
    job_order: Vec<Uuid>,
    // Kept in insertion order; listing filters by job.
    images: Vec<ImageRecord>,
}

/// In-process repository used when no database is configured.
#[derive(Default)]
pub struct MemoryRepository {
    state: RwLock<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn job_count(&self) -> usize {
        self.state.read().await.jobs.len()
    }

    pub async fn image_count(&self) -> usize {
        self.state.read().await.images.len()
    }
}

#[async_trait]
impl JobRepository for MemoryRepository {
    async fn create_job(&self, job: &Job) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        state.job_order.push(job.id);
        state.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<Job>, RepositoryError> {
        Ok(self.state.read().await.jobs.get(&id).cloned())
    }

    async fn jobs_for_owner(&self, owner_id: &str) -> Result<Vec<Job>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .job_order
            .iter()
            .filter_map(|id| state.jobs.get(id))
            .filter(|job| job.is_owned_by(owner_id))
            .cloned()
            .collect())
    }

    async fn set_status(&self, id: Uuid, status: JobStatus) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let job = state
            .jobs
            .get_mut(&id)
            .ok_or(RepositoryError::UnknownJob(id))?;
        job.status = status;
        Ok(())
    }

    async fn delete_job(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        state.jobs.remove(&id);
        state.job_order.retain(|j| *j != id);
        state.images.retain(|img| img.job_id != id);
        Ok(())
    }

    async fn create_image(&self, image: &ImageRecord) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        if !state.jobs.contains_key(&image.job_id) {
            return Err(RepositoryError::UnknownJob(image.job_id));
        }
        state.images.push(image.clone());
        Ok(())
    }

    async fn find_image(&self, id: Uuid) -> Result<Option<ImageRecord>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.images.iter().find(|img| img.id == id).cloned())
    }

    async fn list_images(&self, job_id: Uuid) -> Result<Vec<ImageRecord>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .images
            .iter()
            .filter(|img| img.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
