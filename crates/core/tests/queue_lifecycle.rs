//! Queue lifecycle integration tests.
//!
//! These tests drive jobs through the public queue and worker API against a
//! file-backed database: queued -> processing -> completed / failed, plus
//! recovery of jobs left in flight by a previous process.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use phrasebook_core::{
    testing::{fixtures, MockAnnotator, MockAudioService, MockSentenceGenerator, RecordingNotifier},
    ContentPipeline, Database, EnqueueOptions, GenerationQueue, GenerationWorker, JobStatus,
    JobStore, MemoryDictionary, ProcessingStatus, SqliteJobStore, SqliteVocabularyStore,
    StatusNotifier, VocabularyStore, WorkerConfig,
};

/// All collaborators of one queue/worker pair over a shared database file.
struct TestHarness {
    jobs: Arc<SqliteJobStore>,
    vocabulary: Arc<SqliteVocabularyStore>,
    generator: MockSentenceGenerator,
    audio: MockAudioService,
    notifier: Arc<RecordingNotifier>,
    queue: GenerationQueue,
    worker: GenerationWorker,
}

impl TestHarness {
    fn open(db_path: &Path, config: WorkerConfig) -> Self {
        let db = Database::open(db_path).expect("Failed to open database");
        let vocabulary = Arc::new(SqliteVocabularyStore::new(db.clone()));
        let jobs =
            Arc::new(SqliteJobStore::new(db).with_backoff_gate(config.enforce_backoff_gate));
        let generator = MockSentenceGenerator::new();
        let audio = MockAudioService::new();
        let notifier = Arc::new(RecordingNotifier::new());
        let dyn_notifier: Arc<dyn StatusNotifier> = notifier.clone();

        let pipeline = ContentPipeline::new(
            vocabulary.clone(),
            Arc::new(generator.clone()),
            Arc::new(audio.clone()),
            Arc::new(MockAnnotator::new()),
            Arc::new(MemoryDictionary::new()),
            Arc::clone(&dyn_notifier),
        );
        let queue = GenerationQueue::new(
            jobs.clone(),
            vocabulary.clone(),
            Arc::clone(&dyn_notifier),
            config.default_sentence_count,
        );
        let worker = GenerationWorker::new(
            config,
            jobs.clone(),
            vocabulary.clone(),
            pipeline,
            dyn_notifier,
        );

        Self {
            jobs,
            vocabulary,
            generator,
            audio,
            notifier,
            queue,
            worker,
        }
    }

    fn add_word(&self, text: &str) -> i64 {
        self.vocabulary
            .insert_word(fixtures::spanish_word(text))
            .expect("Failed to insert word")
            .id
    }

    /// Poll until the word's job reaches `status`, or give up after ~2s.
    async fn wait_for_job_status(&self, word_id: i64, status: JobStatus) -> bool {
        for _ in 0..200 {
            let job = self.queue.get_job(word_id).unwrap();
            if job.map(|j| j.status) == Some(status) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

fn fast_config() -> WorkerConfig {
    WorkerConfig {
        enabled: true,
        poll_interval_ms: 10,
        backoff_base_ms: 0,
        ..WorkerConfig::default()
    }
}

#[tokio::test]
async fn test_running_worker_drains_queue_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let harness = TestHarness::open(&temp_dir.path().join("test.db"), fast_config());

    let words: Vec<i64> = ["rojo", "verde", "azul"]
        .iter()
        .map(|w| harness.add_word(w))
        .collect();
    for &word_id in &words {
        harness
            .queue
            .enqueue(
                word_id,
                EnqueueOptions {
                    desired_sentence_count: Some(2),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    harness.worker.start().await.unwrap();
    for &word_id in &words {
        assert!(
            harness
                .wait_for_job_status(word_id, JobStatus::Completed)
                .await,
            "word {} was not processed",
            word_id
        );
    }
    harness.worker.stop().await;

    // One generator call per word, in enqueue order
    let requested: Vec<String> = harness
        .generator
        .recorded_requests()
        .await
        .into_iter()
        .map(|r| r.word)
        .collect();
    assert_eq!(requested, vec!["rojo", "verde", "azul"]);

    for &word_id in &words {
        let status = harness.queue.get_status(word_id).unwrap().unwrap();
        assert_eq!(status.processing_status, Some(ProcessingStatus::Ready));
        assert_eq!(status.sentence_count, 2);
    }
    assert_eq!(harness.audio.synthesized_count().await, 6);

    let summary = harness.queue.get_queue_summary(None).unwrap();
    assert_eq!(summary.completed, 3);
    assert_eq!(summary.queued, 0);

    let status = harness.worker.status().await;
    assert!(!status.running);
    assert_eq!(status.completed, 3);
}

#[tokio::test]
async fn test_queue_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let word_id = {
        let harness = TestHarness::open(&db_path, fast_config());
        let word_id = harness.add_word("montaña");
        harness
            .queue
            .enqueue(
                word_id,
                EnqueueOptions {
                    topic: Some("travel".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        word_id
    };

    let harness = TestHarness::open(&db_path, fast_config());
    let job = harness.queue.get_job(word_id).unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.topic.as_deref(), Some("travel"));

    harness.worker.process_next().await.unwrap();

    let job = harness.queue.get_job(word_id).unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    let requests = harness.generator.recorded_requests().await;
    assert_eq!(requests[0].topic.as_deref(), Some("travel"));
}

#[tokio::test]
async fn test_job_abandoned_by_crash_is_recovered_on_quick_restart() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    // A previous process claimed the job and died mid-run
    let word_id = {
        let harness = TestHarness::open(&db_path, fast_config());
        let word_id = harness.add_word("río");
        harness
            .queue
            .enqueue(word_id, EnqueueOptions::default())
            .unwrap();
        let job = harness.jobs.get_next_job().unwrap().unwrap();
        harness.jobs.mark_processing(&job).unwrap().unwrap();
        word_id
    };

    // Restart right away, well inside the stale threshold
    let harness = TestHarness::open(&db_path, fast_config());
    assert_eq!(
        harness.queue.get_job(word_id).unwrap().unwrap().status,
        JobStatus::Processing
    );

    harness.worker.start().await.unwrap();
    assert!(
        harness
            .wait_for_job_status(word_id, JobStatus::Completed)
            .await
    );
    harness.worker.stop().await;

    let job = harness.queue.get_job(word_id).unwrap().unwrap();
    assert_eq!(job.attempts, 2);

    let statuses: Vec<_> = harness
        .notifier
        .updates_for(word_id)
        .into_iter()
        .map(|u| u.processing_status)
        .collect();
    assert_eq!(statuses.first(), Some(&Some(ProcessingStatus::Queued)));
    assert_eq!(statuses.last(), Some(&Some(ProcessingStatus::Ready)));
}

#[tokio::test]
async fn test_failed_word_can_be_requeued() {
    let temp_dir = TempDir::new().unwrap();
    let harness = TestHarness::open(
        &temp_dir.path().join("test.db"),
        WorkerConfig {
            max_attempts: 1,
            ..fast_config()
        },
    );
    let word_id = harness.add_word("viento");

    harness.generator.fail_next(1).await;
    harness
        .queue
        .enqueue(word_id, EnqueueOptions::default())
        .unwrap();
    harness.worker.process_next().await.unwrap();

    let job = harness.queue.get_job(word_id).unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.last_error.is_some());
    assert_eq!(
        harness.queue.get_status(word_id).unwrap().unwrap().processing_status,
        Some(ProcessingStatus::Failed)
    );

    // Re-enqueue resets attempts and clears the error
    let job = harness
        .queue
        .enqueue(word_id, EnqueueOptions::default())
        .unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.attempts, 0);
    assert!(job.last_error.is_none());

    harness.worker.process_next().await.unwrap();
    assert_eq!(
        harness.queue.get_status(word_id).unwrap().unwrap().processing_status,
        Some(ProcessingStatus::Ready)
    );
}
