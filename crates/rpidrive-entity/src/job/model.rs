//! Job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::{JobKind, JobStatus};

/// A background job.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    /// Serial job identifier.
    pub id: i32,
    /// What the job does.
    pub kind: JobKind,
    /// Human-readable description.
    pub description: String,
    /// Kind-specific payload.
    pub data: serde_json::Value,
    /// Current status.
    pub status: JobStatus,
    /// Completion percentage, 0..=100.
    pub progress: i32,
    /// Cooperative stop request.
    pub to_stop: bool,
    /// Volume the job works on; `None` for system-wide jobs.
    pub volume_id: Option<Uuid>,
    /// Failure description when `status` is `ERROR`.
    pub error: Option<String>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Decode the payload into a typed structure.
    pub fn payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }
}

/// Data required to create a new job.
#[derive(Debug, Clone)]
pub struct CreateJob {
    pub kind: JobKind,
    pub description: String,
    pub data: serde_json::Value,
    pub status: JobStatus,
    pub volume_id: Option<Uuid>,
}
