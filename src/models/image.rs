use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Concrete kind of a persisted variant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ImageKind {
    Original,
    SquareOriginal,
    SquareSmall,
}

/// Container format used for every file produced by a job.
///
/// Only PNG and the JPEG family are distinguished; anything that does not
/// declare itself as PNG is written as JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.to_ascii_lowercase().contains("png") => OutputFormat::Png,
            _ => OutputFormat::Jpeg,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            OutputFormat::Png => image::ImageFormat::Png,
            OutputFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// A single stored variant belonging to a job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageRecord {
    pub id: Uuid,
    pub job_id: Uuid,
    pub kind: ImageKind,
    pub storage_key: String,
    pub content_type: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

/// Storage key for a variant: `images/<job_id>/<image_id>.<ext>`.
pub fn storage_key(job_id: Uuid, image_id: Uuid, format: OutputFormat) -> String {
    format!("images/{}/{}.{}", job_id, image_id, format.extension())
}

/// Guess the content type of a stored file from its key's extension.
pub fn content_type_for_key(key: &str) -> &'static str {
    image::ImageFormat::from_path(key)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream")
}
