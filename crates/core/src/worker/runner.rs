//! Generation worker implementation.
//!
//! A single long-lived task that claims one job at a time and drives it
//! through the content pipeline. Shutdown is observed between jobs and while
//! idle, never in the middle of a pipeline run.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::jobs::{Job, JobClaim, JobStatus, JobStore};
use crate::metrics::{JOBS_CLAIMED, JOB_OUTCOMES, PIPELINE_DURATION};
use crate::notifier::{notify_safely, notify_worker_safely, StatusNotifier, WordUpdate};
use crate::vocabulary::{ProcessingStatus, VocabularyStore};

use super::config::WorkerConfig;
use super::pipeline::ContentPipeline;
use super::types::{JobOutcome, PipelineError, WorkerError, WorkerStatus};

struct WorkerInner {
    config: WorkerConfig,
    jobs: Arc<dyn JobStore>,
    vocabulary: Arc<dyn VocabularyStore>,
    pipeline: ContentPipeline,
    notifier: Arc<dyn StatusNotifier>,

    // Runtime state
    running: AtomicBool,
    processed: AtomicU64,
    completed: AtomicU64,
    rescheduled: AtomicU64,
    failed: AtomicU64,
    discarded: AtomicU64,
    stale_requeued: AtomicU64,
    last_error: RwLock<Option<String>>,
}

/// The generation worker - consumes the job queue one job at a time.
pub struct GenerationWorker {
    inner: Arc<WorkerInner>,
    shutdown_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl GenerationWorker {
    /// Create a new worker. Nothing runs until [`start`](Self::start).
    pub fn new(
        config: WorkerConfig,
        jobs: Arc<dyn JobStore>,
        vocabulary: Arc<dyn VocabularyStore>,
        pipeline: ContentPipeline,
        notifier: Arc<dyn StatusNotifier>,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            inner: Arc::new(WorkerInner {
                config,
                jobs,
                vocabulary,
                pipeline,
                notifier,
                running: AtomicBool::new(false),
                processed: AtomicU64::new(0),
                completed: AtomicU64::new(0),
                rescheduled: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                discarded: AtomicU64::new(0),
                stale_requeued: AtomicU64::new(0),
                last_error: RwLock::new(None),
            }),
            shutdown_tx,
            handle: Mutex::new(None),
        }
    }

    /// Start the worker (spawns the loop task).
    ///
    /// With the loop not running, every job in `processing` is an orphan of a
    /// crashed process or a loop that stopped mid-job; all of them are
    /// returned to the queue first. Calling `start` on a running worker does
    /// nothing.
    pub async fn start(&self) -> Result<(), WorkerError> {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            warn!("Generation worker already running");
            return Ok(());
        }

        info!("Starting generation worker");

        if let Err(e) = self.inner.requeue_stale(Duration::ZERO) {
            self.inner.running.store(false, Ordering::SeqCst);
            return Err(e);
        }
        *self.inner.last_error.write().await = None;

        self.shutdown_tx.send_replace(false);
        notify_worker_safely(self.inner.notifier.as_ref(), true);
        let rx = self.shutdown_tx.subscribe();
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { inner.run_loop(rx).await });
        *self.handle.lock().await = Some(handle);

        info!("Generation worker started");
        Ok(())
    }

    /// Stop the worker, waiting for an in-flight job to finish.
    pub async fn stop(&self) {
        let handle = self.handle.lock().await.take();
        let Some(handle) = handle else {
            warn!("Generation worker not running");
            return;
        };

        info!("Stopping generation worker");
        self.shutdown_tx.send_replace(true);

        if let Err(e) = handle.await {
            error!("Generation worker task ended abnormally: {}", e);
        }
        self.inner.running.store(false, Ordering::SeqCst);

        info!("Generation worker stopped");
    }

    /// Get current worker status.
    pub async fn status(&self) -> WorkerStatus {
        let inner = &self.inner;
        WorkerStatus {
            running: inner.running.load(Ordering::SeqCst),
            processed: inner.processed.load(Ordering::Relaxed),
            completed: inner.completed.load(Ordering::Relaxed),
            rescheduled: inner.rescheduled.load(Ordering::Relaxed),
            failed: inner.failed.load(Ordering::Relaxed),
            discarded: inner.discarded.load(Ordering::Relaxed),
            stale_requeued: inner.stale_requeued.load(Ordering::Relaxed),
            last_error: inner.last_error.read().await.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Run one loop iteration: claim the next job, if any, and process it.
    ///
    /// Returns `None` when nothing was claimable.
    pub async fn process_next(&self) -> Result<Option<JobOutcome>, WorkerError> {
        self.inner.process_next().await
    }
}

impl WorkerInner {
    async fn run_loop(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("Generation loop started");
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);
        let stale_after = Duration::from_secs(self.config.stale_after_secs);

        loop {
            if *shutdown_rx.borrow() {
                info!("Generation loop received shutdown signal");
                break;
            }

            match self.process_next().await {
                Ok(Some(_)) => continue,
                Ok(None) => {
                    if let Err(e) = self.requeue_stale(stale_after) {
                        self.record_fatal(e).await;
                        break;
                    }
                    tokio::select! {
                        _ = shutdown_rx.changed() => {}
                        _ = tokio::time::sleep(poll_interval) => {}
                    }
                }
                Err(e) => {
                    self.record_fatal(e).await;
                    break;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        notify_worker_safely(self.notifier.as_ref(), false);
        info!("Generation loop exited");
    }

    async fn record_fatal(&self, e: WorkerError) {
        error!("Generation loop stopped: {}", e);
        *self.last_error.write().await = Some(e.to_string());
    }

    /// Return jobs stuck in `processing` for at least `older_than` to the queue.
    fn requeue_stale(&self, older_than: Duration) -> Result<(), WorkerError> {
        let word_ids = self.jobs.requeue_stale(older_than)?;

        for word_id in &word_ids {
            info!(word_id, "Requeued stale job");
            if let Some(status) = self.vocabulary.word_status(*word_id)? {
                self.notify(WordUpdate::from(status));
            }
        }
        self.stale_requeued
            .fetch_add(word_ids.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    async fn process_next(&self) -> Result<Option<JobOutcome>, WorkerError> {
        let Some(job) = self.jobs.get_next_job()? else {
            return Ok(None);
        };

        let outcome = match self.jobs.mark_processing(&job)? {
            Some(claim) => self.process_claimed(&job, claim).await?,
            None => {
                debug!(word_id = job.word_id, "Job changed before it could be claimed");
                JobOutcome::ClaimLost
            }
        };

        JOB_OUTCOMES.with_label_values(&[outcome.label()]).inc();
        Ok(Some(outcome))
    }

    async fn process_claimed(&self, job: &Job, claim: JobClaim) -> Result<JobOutcome, WorkerError> {
        JOBS_CLAIMED.inc();
        self.processed.fetch_add(1, Ordering::Relaxed);
        info!(
            word_id = claim.word_id,
            attempt = claim.attempts,
            "Processing generation job"
        );

        self.set_word_status(claim.word_id, ProcessingStatus::Processing)?;

        let word = match self.vocabulary.get_word(claim.word_id) {
            Ok(Some(word)) => word,
            Ok(None) => {
                info!(word_id = claim.word_id, "Word no longer exists, completing job");
                return Ok(if self.jobs.complete(&claim)? {
                    JobOutcome::WordMissing
                } else {
                    self.discard(&claim)?
                });
            }
            Err(e) if e.is_infrastructure() => return Err(e.into()),
            Err(e) => {
                let err = PipelineError::Vocabulary(e);
                return self.handle_failure(&claim, err);
            }
        };

        let started = Instant::now();
        let result = self.pipeline.run(&word, job).await;
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(report) => {
                PIPELINE_DURATION
                    .with_label_values(&["success"])
                    .observe(elapsed);
                if !self.jobs.complete(&claim)? {
                    return self.discard(&claim);
                }
                self.set_word_status(claim.word_id, ProcessingStatus::Ready)?;
                self.completed.fetch_add(1, Ordering::Relaxed);
                info!(
                    word_id = claim.word_id,
                    stored = report.stored,
                    sentence_count = report.sentence_count,
                    "Generation job completed"
                );
                Ok(JobOutcome::Completed)
            }
            Err(e) => {
                PIPELINE_DURATION
                    .with_label_values(&["failure"])
                    .observe(elapsed);
                if e.is_infrastructure() {
                    return Err(e.into());
                }
                self.handle_failure(&claim, e)
            }
        }
    }

    /// Reschedule or fail a claimed job after a job-local error.
    fn handle_failure(&self, claim: &JobClaim, err: PipelineError) -> Result<JobOutcome, WorkerError> {
        let message = err.to_string();
        let attempt = claim.attempts;

        if attempt < self.config.max_attempts {
            let delay = Duration::from_millis(
                self.config
                    .backoff_base_ms
                    .saturating_mul(u64::from(attempt)),
            );
            warn!(
                word_id = claim.word_id,
                attempt,
                max_attempts = self.config.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %message,
                "Generation job failed, will retry"
            );
            if !self.jobs.reschedule(claim, delay, Some(&message))? {
                return self.discard(claim);
            }
            self.set_word_status(claim.word_id, ProcessingStatus::Queued)?;
            self.rescheduled.fetch_add(1, Ordering::Relaxed);
            Ok(JobOutcome::Rescheduled { delay })
        } else {
            error!(
                word_id = claim.word_id,
                attempt,
                error = %message,
                "Generation job failed permanently"
            );
            if !self.jobs.fail(claim, &message)? {
                return self.discard(claim);
            }
            self.set_word_status(claim.word_id, ProcessingStatus::Failed)?;
            self.failed.fetch_add(1, Ordering::Relaxed);
            Ok(JobOutcome::Failed)
        }
    }

    /// The claim went stale. The word's status follows the fresh job.
    fn discard(&self, claim: &JobClaim) -> Result<JobOutcome, WorkerError> {
        info!(
            word_id = claim.word_id,
            version = claim.version,
            "Job was re-enqueued while running, discarding result"
        );
        self.discarded.fetch_add(1, Ordering::Relaxed);

        if let Some(current) = self.jobs.get(claim.word_id)? {
            if current.status == JobStatus::Queued {
                self.set_word_status(claim.word_id, ProcessingStatus::Queued)?;
            }
        }
        Ok(JobOutcome::Discarded)
    }

    /// Update the word's processing status and notify. Only an unreachable
    /// store is an error; a vanished word is logged.
    fn set_word_status(&self, word_id: i64, status: ProcessingStatus) -> Result<(), WorkerError> {
        match self.vocabulary.set_processing_status(word_id, status) {
            Ok(Some(word_status)) => {
                self.notify(WordUpdate::from(word_status));
                Ok(())
            }
            Ok(None) => {
                debug!(word_id, %status, "Word vanished before status update");
                Ok(())
            }
            Err(e) if e.is_infrastructure() => Err(e.into()),
            Err(e) => {
                warn!(word_id, %status, error = %e, "Failed to update word status");
                Ok(())
            }
        }
    }

    fn notify(&self, update: WordUpdate) {
        notify_safely(self.notifier.as_ref(), &update);
    }
}
