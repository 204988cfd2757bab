//! Durable generation job queue.
//!
//! One row per word in `generation_jobs`. Rows move along
//! `queued -> processing -> {completed | queued (retry) | failed}`; a fresh
//! enqueue resets any row back to `queued` and bumps its version so that an
//! in-flight claim can no longer commit.

mod queue;
mod sqlite_store;
mod store;
mod types;

pub use queue::{EnqueueOptions, GenerationQueue, QueueError};
pub use sqlite_store::SqliteJobStore;
pub use store::{JobError, JobStore};
pub use types::{EnqueueRequest, Job, JobClaim, JobStatus, QueueSummary, QueuedWord};
