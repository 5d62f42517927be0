use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};

/// Byte storage for variant files, addressed by an opaque key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Files under a local media root.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key below the root, refusing anything that could escape it.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let clean = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !clean {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalStore {
    async fn put(&self, key: &str, data: &[u8], _content_type: &str) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| StorageError::Io { path, source: e })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::Io { path, source: e }),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io { path, source: e }),
        }
    }
}

/// Cloudflare R2 object storage (S3-compatible).
pub struct R2Store {
    bucket: Box<Bucket>,
}

impl R2Store {
    pub fn new(
        bucket_name: &str,
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: "auto".to_string(),
            endpoint: endpoint.to_string(),
        };

        let credentials =
            Credentials::new(Some(access_key), Some(secret_key), None, None, None)
                .map_err(|e| StorageError::Config(e.to_string()))?;

        let bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self { bucket })
    }
}

/// Map a non-2xx S3 response to an error.
///
/// rust-s3 is built without `fail-on-err`, so error statuses come back as
/// ordinary responses.
fn check_status(key: &str, status: u16, body: &[u8]) -> Result<(), StorageError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(StorageError::NotFound(key.to_string())),
        _ => {
            let body = String::from_utf8_lossy(body);
            Err(StorageError::Http {
                status,
                body: body.chars().take(512).collect(),
            })
        }
    }
}

#[async_trait]
impl BlobStore for R2Store {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await?;
        check_status(key, response.status_code(), response.as_slice())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let response = self.bucket.get_object(key).await?;
        check_status(key, response.status_code(), response.as_slice())?;
        Ok(response.to_vec())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let response = self.bucket.delete_object(key).await?;
        match check_status(key, response.status_code(), response.as_slice()) {
            Err(StorageError::NotFound(_)) => Ok(()),
            other => other,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("S3 operation failed: {0}")]
    S3(#[from] s3::error::S3Error),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Object store answered HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("Storage configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_store_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        store
            .put("images/job/a.png", b"payload", "image/png")
            .await
            .unwrap();
        assert!(dir.path().join("images/job/a.png").exists());
        assert_eq!(store.get("images/job/a.png").await.unwrap(), b"payload");

        store.delete("images/job/a.png").await.unwrap();
        assert!(matches!(
            store.get("images/job/a.png").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_local_store_delete_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        store.delete("images/nothing.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_local_store_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        for key in ["../etc/passwd", "/abs/path.png", "images/../../x", ""] {
            let err = store.put(key, b"x", "image/png").await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "key {key:?}");
        }
    }

    /// Serve every request with a fixed status and body.
    async fn spawn_object_store(status: u16, body: &'static str) -> String {
        use axum::http::StatusCode;

        let status = StatusCode::from_u16(status).unwrap();
        let app = axum::Router::new().fallback(move || async move { (status, body) });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn r2_store(endpoint: &str) -> R2Store {
        let store = R2Store::new("variants", endpoint, "key", "secret").unwrap();
        R2Store {
            bucket: store.bucket.with_path_style(),
        }
    }

    #[tokio::test]
    async fn test_r2_denied_requests_are_errors() {
        let endpoint =
            spawn_object_store(403, "<Error><Code>AccessDenied</Code></Error>").await;
        let store = r2_store(&endpoint);

        let put = store.put("images/a/b.png", b"x", "image/png").await;
        assert!(matches!(put, Err(StorageError::Http { status: 403, .. })));

        let get = store.get("images/a/b.png").await;
        match get {
            Err(StorageError::Http { status, body }) => {
                assert_eq!(status, 403);
                assert!(body.contains("AccessDenied"));
            }
            other => panic!("expected HTTP error, got {other:?}"),
        }

        let delete = store.delete("images/a/b.png").await;
        assert!(matches!(delete, Err(StorageError::Http { status: 403, .. })));
    }

    #[tokio::test]
    async fn test_r2_missing_object() {
        let endpoint = spawn_object_store(404, "<Error><Code>NoSuchKey</Code></Error>").await;
        let store = r2_store(&endpoint);

        assert!(matches!(
            store.get("images/a/b.png").await,
            Err(StorageError::NotFound(_))
        ));
        store.delete("images/a/b.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_r2_server_error_on_put() {
        let endpoint = spawn_object_store(500, "<Error><Code>InternalError</Code></Error>").await;
        let store = r2_store(&endpoint);

        let err = store
            .put("images/a/b.jpg", b"x", "image/jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Http { status: 500, .. }));
    }
}
