//! Generation job types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a job row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Completed and failed rows only change again through a fresh enqueue.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}

/// A durable request to produce content for one word.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub word_id: i64,
    pub language: String,
    pub topic: Option<String>,
    pub desired_sentence_count: u32,
    pub status: JobStatus,
    /// Number of times the job has been claimed since its last enqueue.
    pub attempts: u32,
    /// Bumped on every enqueue; guards commits of in-flight claims.
    pub version: i64,
    pub last_error: Option<String>,
    /// Earliest time the job may be claimed.
    pub available_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
}

/// Proof of a successful claim.
///
/// Every commit (`reschedule`, `complete`, `fail`) is conditioned on the row
/// still carrying this claim's version and being in `processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobClaim {
    pub job_id: i64,
    pub word_id: i64,
    pub version: i64,
    /// Attempt number of this claim (1-based).
    pub attempts: u32,
}

/// Parameters for enqueueing a word.
#[derive(Debug, Clone)]
pub struct EnqueueRequest {
    pub word_id: i64,
    pub language: String,
    pub topic: Option<String>,
    pub desired_sentence_count: u32,
}

/// A queued or in-flight word in a summary listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedWord {
    pub word_id: i64,
    pub text: String,
    pub topic: Option<String>,
}

/// Snapshot of the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSummary {
    pub queued: u32,
    pub processing: u32,
    pub completed: u32,
    pub failed: u32,
    /// Queued words in claim order.
    pub queued_words: Vec<QueuedWord>,
    pub processing_words: Vec<QueuedWord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_parse() {
        assert_eq!("queued".parse::<JobStatus>().unwrap(), JobStatus::Queued);
        assert_eq!("failed".parse::<JobStatus>().unwrap(), JobStatus::Failed);
        assert!("ready".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }
}
