//! Job storage trait and error type.

use std::time::Duration;

use thiserror::Error;

use crate::db::StorageError;

use super::{EnqueueRequest, Job, JobClaim, QueueSummary};

/// Error type for job store operations.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Word not found: {0}")]
    WordNotFound(i64),
}

impl JobError {
    /// Whether the store is unreachable.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, JobError::Storage(e) if e.is_unavailable())
    }
}

impl From<rusqlite::Error> for JobError {
    fn from(err: rusqlite::Error) -> Self {
        JobError::Storage(err.into())
    }
}

/// Durable job queue, one row per word.
pub trait JobStore: Send + Sync {
    /// Insert or reset the word's job to `queued` and mark the word queued,
    /// atomically. Succeeds even while the word's job is processing.
    fn enqueue(&self, request: EnqueueRequest) -> Result<Job, JobError>;

    /// The next claimable job, or `None` if nothing is eligible.
    fn get_next_job(&self) -> Result<Option<Job>, JobError>;

    /// Move a queued job to `processing`. Returns `None` if the row changed
    /// since it was read.
    fn mark_processing(&self, job: &Job) -> Result<Option<JobClaim>, JobError>;

    /// Return a claimed job to the queue, not claimable before `delay` elapses.
    fn reschedule(
        &self,
        claim: &JobClaim,
        delay: Duration,
        last_error: Option<&str>,
    ) -> Result<bool, JobError>;

    /// Mark a claimed job completed.
    fn complete(&self, claim: &JobClaim) -> Result<bool, JobError>;

    /// Mark a claimed job failed.
    fn fail(&self, claim: &JobClaim, message: &str) -> Result<bool, JobError>;

    /// The job row for a word.
    fn get(&self, word_id: i64) -> Result<Option<Job>, JobError>;

    /// Counts per status plus the queued and processing listings.
    fn queue_summary(&self, language: Option<&str>) -> Result<QueueSummary, JobError>;

    /// Return jobs stuck in `processing` for longer than `older_than` to the
    /// queue. Returns the affected word IDs.
    fn requeue_stale(&self, older_than: Duration) -> Result<Vec<i64>, JobError>;
}
