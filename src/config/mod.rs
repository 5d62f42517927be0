use serde::Deserialize;

use crate::services::jobs::FailurePolicy;

/// Where variant files are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Local,
    R2,
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string. Without it records are kept in memory.
    pub database_url: Option<String>,

    #[serde(default)]
    pub storage_backend: StorageBackend,

    /// Root directory for the local blob store
    #[serde(default = "default_media_root")]
    pub media_root: String,

    /// R2 bucket name
    pub r2_bucket: Option<String>,

    /// R2 endpoint URL
    pub r2_endpoint: Option<String>,

    /// R2 access key ID (S3-compatible)
    pub r2_access_key: Option<String>,

    /// R2 secret access key (S3-compatible)
    pub r2_secret_key: Option<String>,

    /// HMAC secret for bearer token verification
    pub jwt_secret: String,

    #[serde(default)]
    pub job_failure_policy: FailurePolicy,

    /// Request body limit in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// Connection settings for R2, all required once the backend is selected.
#[derive(Debug)]
pub struct R2Settings<'a> {
    pub bucket: &'a str,
    pub endpoint: &'a str,
    pub access_key: &'a str,
    pub secret_key: &'a str,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_media_root() -> String {
    "./media".to_string()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn r2_settings(&self) -> Result<R2Settings<'_>, ConfigError> {
        fn required<'a>(
            value: &'a Option<String>,
            name: &'static str,
        ) -> Result<&'a str, ConfigError> {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        }

        Ok(R2Settings {
            bucket: required(&self.r2_bucket, "R2_BUCKET")?,
            endpoint: required(&self.r2_endpoint, "R2_ENDPOINT")?,
            access_key: required(&self.r2_access_key, "R2_ACCESS_KEY")?,
            secret_key: required(&self.r2_secret_key, "R2_SECRET_KEY")?,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set when STORAGE_BACKEND=r2")]
    Missing(&'static str),
}
