use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use square_jobs::{
    app_state::AppState,
    config::{AppConfig, StorageBackend},
    db::{self, JobRepository, MemoryRepository, PgRepository},
    routes,
    services::{
        auth::TokenVerifier,
        storage::{BlobStore, LocalStore, R2Store},
    },
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing square-jobs server");

    let prometheus_handle = Arc::new(
        routes::metrics::install_recorder().expect("Failed to install Prometheus metrics recorder"),
    );

    let repo: Arc<dyn JobRepository> = match config.database_url.as_deref() {
        Some(database_url) => {
            tracing::info!("Connecting to PostgreSQL database");
            let pool = db::init_pool(database_url)
                .await
                .expect("Failed to connect to database");

            tracing::info!("Running database migrations");
            db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");

            Arc::new(PgRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, keeping jobs in memory");
            Arc::new(MemoryRepository::new())
        }
    };

    let storage: Arc<dyn BlobStore> = match config.storage_backend {
        StorageBackend::Local => {
            tracing::info!(media_root = %config.media_root, "Using local blob storage");
            std::fs::create_dir_all(&config.media_root).expect("Media root is not accessible");
            Arc::new(LocalStore::new(&config.media_root))
        }
        StorageBackend::R2 => {
            tracing::info!("Initializing R2 storage client");
            let r2 = config.r2_settings().expect("Incomplete R2 configuration");
            Arc::new(
                R2Store::new(r2.bucket, r2.endpoint, r2.access_key, r2.secret_key)
                    .expect("Failed to initialize R2 client"),
            )
        }
    };

    let tokens = TokenVerifier::new(&config.jwt_secret).expect("Invalid JWT_SECRET");

    tracing::info!(policy = ?config.job_failure_policy, "Job failure policy");
    let state = AppState::new(repo, storage, tokens, config.job_failure_policy);

    let app = routes::api_router(state)
        .merge(
            Router::new()
                .route("/metrics", get(routes::metrics::prometheus_metrics))
                .with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
