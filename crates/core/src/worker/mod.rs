//! Generation worker.
//!
//! Claims jobs from the [`JobStore`](crate::jobs::JobStore) one at a time and
//! runs the [`ContentPipeline`] for each: audio backfill, sentence
//! acquisition, annotation and verification. Failures are retried with a
//! linear backoff until `max_attempts` is reached.

mod config;
mod pipeline;
mod runner;
mod types;

pub use config::WorkerConfig;
pub use pipeline::ContentPipeline;
pub use runner::GenerationWorker;
pub use types::{JobOutcome, PipelineError, PipelineReport, WorkerError, WorkerStatus};
