use serde::{Deserialize, Serialize};

/// Lifecycle of an ingestion job as exposed by `GET /jobs/{job_id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Registered, possibly waiting for another job on the same table.
    Pending,
    /// Rows committed so far.
    InProgress(u64),
    Completed(String),
    Failed(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed(_) | JobStatus::Failed(_))
    }
}
