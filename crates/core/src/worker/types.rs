//! Types for the generation worker.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::AudioError;
use crate::generator::GeneratorError;
use crate::jobs::JobError;
use crate::vocabulary::VocabularyError;

/// Failure of one content pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("sentence generation failed: {0}")]
    Generation(#[from] GeneratorError),

    #[error("audio failed: {0}")]
    Audio(#[from] AudioError),

    #[error("vocabulary store error: {0}")]
    Vocabulary(#[from] VocabularyError),

    /// Fewer sentences than requested after the run.
    #[error("word {word_id} has {have} of {want} sentences")]
    Shortfall { word_id: i64, have: u32, want: u32 },
}

impl PipelineError {
    /// Whether the failure means the vocabulary database is unreachable.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, PipelineError::Vocabulary(e) if e.is_infrastructure())
    }
}

/// Errors that stop the worker loop.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("job store error: {0}")]
    JobStore(#[from] JobError),

    #[error("vocabulary store error: {0}")]
    Vocabulary(#[from] VocabularyError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// What happened to one claimed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Pipeline succeeded; word is ready.
    Completed,
    /// The word no longer exists; job completed without running the pipeline.
    WordMissing,
    /// Pipeline failed; job returned to the queue.
    Rescheduled { delay: Duration },
    /// Pipeline failed on the last allowed attempt.
    Failed,
    /// The job was re-enqueued while running; the result was dropped.
    Discarded,
    /// Another claim won the row.
    ClaimLost,
}

impl JobOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            JobOutcome::Completed => "completed",
            JobOutcome::WordMissing => "word_missing",
            JobOutcome::Rescheduled { .. } => "rescheduled",
            JobOutcome::Failed => "failed",
            JobOutcome::Discarded => "discarded",
            JobOutcome::ClaimLost => "claim_lost",
        }
    }
}

/// What one pipeline run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub audio_backfilled: u32,
    /// Candidates requested from the generator (0 when nothing was missing).
    pub requested: u32,
    pub stored: u32,
    pub duplicates: u32,
    pub annotated: u32,
    pub sentence_count: u32,
}

/// Current status of the worker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub running: bool,
    /// Jobs claimed since the process started.
    pub processed: u64,
    pub completed: u64,
    pub rescheduled: u64,
    pub failed: u64,
    pub discarded: u64,
    /// Jobs requeued from `processing` on start.
    pub stale_requeued: u64,
    /// The error that stopped the loop, if it stopped on its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}
