//! Worker configuration.

use serde::{Deserialize, Serialize};

/// `[worker]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Start the worker with the server.
    /// When disabled, it can still be started through the API.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// How long to sleep when the queue is empty (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Claims allowed before a job is marked failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Retry delay per attempt (milliseconds); the n-th retry waits
    /// `n * backoff_base_ms`.
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,

    /// Hide rescheduled jobs until their delay has elapsed. When off, retries
    /// are only deferred by queue order.
    #[serde(default = "default_enabled")]
    pub enforce_backoff_gate: bool,

    /// While idle, jobs left in `processing` longer than this are requeued.
    /// On start every `processing` job is requeued regardless of age.
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: u64,

    /// Sentences per word when an enqueue does not say.
    #[serde(default = "default_sentence_count")]
    pub default_sentence_count: u32,
}

fn default_enabled() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base() -> u64 {
    30_000
}

fn default_stale_after() -> u64 {
    600
}

fn default_sentence_count() -> u32 {
    3
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            poll_interval_ms: default_poll_interval(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base(),
            enforce_backoff_gate: default_enabled(),
            stale_after_secs: default_stale_after(),
            default_sentence_count: default_sentence_count(),
        }
    }
}
