//! Test helpers: an in-process server and typed API calls against it.

#![allow(dead_code)]

use std::sync::Arc;

use reqwest::multipart;
use reqwest::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use square_jobs::{
    app_state::AppState,
    db::MemoryRepository,
    routes,
    services::{auth::TokenVerifier, jobs::FailurePolicy, storage::LocalStore},
};

pub const TEST_SECRET: &str = "test-secret";

/// Response from POST /api/job/
#[derive(Debug, Deserialize)]
pub struct CreateJobResponse {
    pub ok: bool,
    pub job_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ImageEntry {
    pub pk: Uuid,
    pub kind: String,
    pub width: u32,
    pub height: u32,
}

/// Response from GET /api/job/{id}/
#[derive(Debug, Deserialize)]
pub struct JobDetailResponse {
    pub ok: bool,
    pub pk: Uuid,
    pub kind: String,
    pub status: String,
    pub images: Vec<ImageEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

/// A running server backed by an in-memory repository and a temp media root.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub repo: Arc<MemoryRepository>,
    tokens: TokenVerifier,
    _media: tempfile::TempDir,
}

pub async fn spawn_app(policy: FailurePolicy) -> TestApp {
    let media = tempfile::tempdir().expect("Failed to create media root");
    let repo = Arc::new(MemoryRepository::new());
    let store = Arc::new(LocalStore::new(media.path()));
    let state = AppState::new(
        repo.clone(),
        store,
        TokenVerifier::new(TEST_SECRET).expect("Failed to create verifier"),
        policy,
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    let app = routes::api_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server error");
    });

    TestApp {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::new(),
        repo,
        tokens: TokenVerifier::new(TEST_SECRET).expect("Failed to create verifier"),
        _media: media,
    }
}

impl TestApp {
    pub fn token_for(&self, user: &str) -> String {
        self.tokens.issue(user, None).expect("Failed to issue token")
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn job_form(bytes: Vec<u8>, file_name: &str, mime: &str, kind: &str) -> multipart::Form {
        multipart::Form::new()
            .part(
                "file",
                multipart::Part::bytes(bytes)
                    .file_name(file_name.to_string())
                    .mime_str(mime)
                    .expect("Invalid mime type"),
            )
            .text("kind", kind.to_string())
    }

    /// POST /api/job/ as `user` (or anonymously).
    pub async fn post_job(&self, user: Option<&str>, form: multipart::Form) -> reqwest::Response {
        let mut request = self.client.post(self.url("/api/job/")).multipart(form);
        if let Some(user) = user {
            request = request.bearer_auth(self.token_for(user));
        }
        request.send().await.expect("Request failed")
    }

    /// Upload and expect success; returns the new job id.
    pub async fn create_job(
        &self,
        user: &str,
        bytes: Vec<u8>,
        file_name: &str,
        mime: &str,
        kind: &str,
    ) -> Uuid {
        let response = self
            .post_job(Some(user), Self::job_form(bytes, file_name, mime, kind))
            .await;
        let status = response.status();
        let body = response.text().await.expect("No body");
        assert_eq!(status, StatusCode::OK, "job creation failed: {}", body);

        let parsed: CreateJobResponse = serde_json::from_str(&body).expect("Bad job response");
        assert!(parsed.ok);
        parsed.job_id
    }

    pub async fn get_as(&self, user: &str, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(self.token_for(user))
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn get_job(&self, user: &str, job_id: Uuid) -> JobDetailResponse {
        let response = self.get_as(user, &format!("/api/job/{}/", job_id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        response.json().await.expect("Bad job detail")
    }
}
