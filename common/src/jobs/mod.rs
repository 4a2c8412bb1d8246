use serde::{Deserialize, Serialize};

/// Status of a background job as reported by `GET /api/campaign/status/{id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    /// Percentage of contacts processed so far.
    InProgress(u32),
    /// Summary of the finished dispatch.
    Completed(String),
}

impl JobStatus {
    /// Final status of a dispatch with the given counters.
    pub fn completed(sent: usize, failed: usize) -> Self {
        JobStatus::Completed(format!("sent {}, failed {}", sent, failed))
    }
}
