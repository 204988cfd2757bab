//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Worker (claims, outcomes, pipeline duration)
//! - Content (sentences stored, audio, annotation)
//! - External services (sentence sources, LLM)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Worker Metrics
// =============================================================================

/// Jobs claimed by the worker.
pub static JOBS_CLAIMED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("phrasebook_jobs_claimed_total", "Total jobs claimed").unwrap()
});

/// Job outcomes by kind.
pub static JOB_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("phrasebook_job_outcomes_total", "Total job outcomes"),
        &["outcome"], // "completed", "rescheduled", "failed", "discarded", "stale"
    )
    .unwrap()
});

/// Content pipeline duration in seconds.
pub static PIPELINE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "phrasebook_pipeline_duration_seconds",
            "Duration of one content pipeline run",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Content Metrics
// =============================================================================

/// Sentences stored by audio source.
pub static SENTENCES_STORED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("phrasebook_sentences_stored_total", "Total sentences stored"),
        &["audio"], // "synthesized", "downloaded"
    )
    .unwrap()
});

/// Duplicate candidates skipped.
pub static DUPLICATES_SKIPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "phrasebook_duplicate_sentences_total",
        "Generated sentences skipped as duplicates",
    )
    .unwrap()
});

/// Audio operations by kind and result.
pub static AUDIO_OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("phrasebook_audio_operations_total", "Total audio operations"),
        &["operation", "result"], // operation: "synthesize", "download"
    )
    .unwrap()
});

/// Annotation failures (never fail a job).
pub static ANNOTATION_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "phrasebook_annotation_failures_total",
        "Total sentence annotation failures",
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "phrasebook_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service", "operation"],
    )
    .unwrap()
});

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "phrasebook_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

/// LLM tokens used.
pub static LLM_TOKENS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("phrasebook_llm_tokens_total", "Total LLM tokens used"),
        &["provider", "direction"], // direction: "input", "output"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Record one external service call.
pub fn record_external_call(service: &str, operation: &str, seconds: f64, success: bool) {
    EXTERNAL_SERVICE_DURATION
        .with_label_values(&[service, operation])
        .observe(seconds);
    EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&[service, operation, if success { "success" } else { "error" }])
        .inc();
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Worker
        Box::new(JOBS_CLAIMED.clone()),
        Box::new(JOB_OUTCOMES.clone()),
        Box::new(PIPELINE_DURATION.clone()),
        // Content
        Box::new(SENTENCES_STORED.clone()),
        Box::new(DUPLICATES_SKIPPED.clone()),
        Box::new(AUDIO_OPERATIONS.clone()),
        Box::new(ANNOTATION_FAILURES.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
        Box::new(LLM_TOKENS.clone()),
    ]
}
