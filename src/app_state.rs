use std::sync::Arc;

use crate::db::JobRepository;
use crate::services::{
    auth::TokenVerifier,
    jobs::{FailurePolicy, JobService},
    storage::BlobStore,
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn JobRepository>,
    pub jobs: Arc<JobService>,
    pub tokens: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn JobRepository>,
        storage: Arc<dyn BlobStore>,
        tokens: TokenVerifier,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            jobs: Arc::new(JobService::new(repo.clone(), storage, policy)),
            repo,
            tokens: Arc::new(tokens),
        }
    }
}
