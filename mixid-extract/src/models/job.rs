//! Extraction job bookkeeping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bookkeeping for one extraction request
///
/// Never persisted. Dropped from the registry a while after the run ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: Uuid,
    pub source_url: String,
    /// Chunk duration in seconds
    pub chunk_duration: u32,
    pub started_at: DateTime<Utc>,
}

impl Job {
    pub fn new(source_url: impl Into<String>, chunk_duration: u32) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            source_url: source_url.into(),
            chunk_duration,
            started_at: Utc::now(),
        }
    }

    /// Seconds since the job was accepted
    pub fn elapsed_seconds(&self) -> u64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
            .max(0) as u64
    }
}

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Running,
    Completed,
    Failed,
}

/// Point-in-time view of a job, as served by GET /jobs/:job_id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(flatten)]
    pub job: Job,
    pub state: JobState,
    /// Last reported progress percentage
    pub progress: f64,
    /// Run-level error of a failed job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Seconds the job ran, or has been running so far
    pub elapsed_seconds: u64,
}
