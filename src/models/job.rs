use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Which set of variants a job was asked to produce.
///
/// `AllThree` only ever labels a request; it never appears on a stored
/// image, which carries an [`ImageKind`](crate::models::image::ImageKind) instead.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobKind {
    Original,
    SquareOriginal,
    SquareSmall,
    AllThree,
}

/// Job lifecycle: `Started` until every variant is stored, then `Done`.
///
/// `Failed` is only ever persisted when failed jobs are kept around.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Started,
    Failed,
    Done,
}

/// A user-initiated image processing request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: Uuid,
    pub owner_id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(owner_id: impl Into<String>, kind: JobKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            kind,
            status: JobStatus::Started,
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }
}
