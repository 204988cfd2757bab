//! Caller-facing generation queue operations.

use std::sync::Arc;

use thiserror::Error;

use crate::notifier::{notify_safely, StatusNotifier, WordUpdate};
use crate::vocabulary::{VocabularyError, VocabularyStore, WordStatus};

use super::{EnqueueRequest, Job, JobError, JobStore, QueueSummary};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Word not found: {0}")]
    WordNotFound(i64),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Job store error: {0}")]
    Job(#[from] JobError),

    #[error("Vocabulary error: {0}")]
    Vocabulary(#[from] VocabularyError),
}

impl QueueError {
    pub fn is_infrastructure(&self) -> bool {
        match self {
            QueueError::Job(e) => e.is_infrastructure(),
            QueueError::Vocabulary(e) => e.is_infrastructure(),
            _ => false,
        }
    }
}

/// Optional overrides for an enqueue.
#[derive(Debug, Clone, Default)]
pub struct EnqueueOptions {
    /// Defaults to the word's language.
    pub language: Option<String>,
    pub topic: Option<String>,
    /// Defaults to the configured sentence count.
    pub desired_sentence_count: Option<u32>,
}

/// Enqueue, status and summary operations over the job and vocabulary stores.
pub struct GenerationQueue {
    jobs: Arc<dyn JobStore>,
    vocabulary: Arc<dyn VocabularyStore>,
    notifier: Arc<dyn StatusNotifier>,
    default_sentence_count: u32,
}

impl GenerationQueue {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        vocabulary: Arc<dyn VocabularyStore>,
        notifier: Arc<dyn StatusNotifier>,
        default_sentence_count: u32,
    ) -> Self {
        Self {
            jobs,
            vocabulary,
            notifier,
            default_sentence_count,
        }
    }

    /// Queue a word for content generation.
    ///
    /// Re-enqueueing a word resets its job, even while it is being processed;
    /// the in-flight result is then discarded.
    pub fn enqueue(&self, word_id: i64, options: EnqueueOptions) -> Result<Job, QueueError> {
        let desired = options
            .desired_sentence_count
            .unwrap_or(self.default_sentence_count);
        if desired == 0 {
            return Err(QueueError::InvalidRequest(
                "desired_sentence_count must be at least 1".to_string(),
            ));
        }

        let word = self
            .vocabulary
            .get_word(word_id)?
            .ok_or(QueueError::WordNotFound(word_id))?;

        let job = self
            .jobs
            .enqueue(EnqueueRequest {
                word_id,
                language: options.language.unwrap_or(word.language),
                topic: options.topic,
                desired_sentence_count: desired,
            })
            .map_err(|e| match e {
                JobError::WordNotFound(id) => QueueError::WordNotFound(id),
                other => QueueError::Job(other),
            })?;

        tracing::info!(
            word_id,
            job_id = job.id,
            language = %job.language,
            desired_sentence_count = desired,
            "Word queued for generation"
        );

        if let Some(status) = self.vocabulary.word_status(word_id)? {
            notify_safely(self.notifier.as_ref(), &WordUpdate::from(status));
        }

        Ok(job)
    }

    /// Current processing status and sentence count of a word.
    pub fn get_status(&self, word_id: i64) -> Result<Option<WordStatus>, QueueError> {
        Ok(self.vocabulary.word_status(word_id)?)
    }

    /// The job row for a word.
    pub fn get_job(&self, word_id: i64) -> Result<Option<Job>, QueueError> {
        Ok(self.jobs.get(word_id)?)
    }

    pub fn get_queue_summary(&self, language: Option<&str>) -> Result<QueueSummary, QueueError> {
        Ok(self.jobs.queue_summary(language)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::db::Database;
    use crate::jobs::{JobStatus, SqliteJobStore};
    use crate::notifier::{CallbackNotifier, NotifyError};
    use crate::vocabulary::{NewWord, ProcessingStatus, SqliteVocabularyStore};

    struct Fixture {
        queue: GenerationQueue,
        vocabulary: Arc<SqliteVocabularyStore>,
        updates: Arc<Mutex<Vec<WordUpdate>>>,
    }

    fn create_fixture() -> Fixture {
        let db = Database::in_memory().unwrap();
        let vocabulary = Arc::new(SqliteVocabularyStore::new(db.clone()));
        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = updates.clone();
        let notifier = CallbackNotifier::new(move |u: &WordUpdate| -> Result<(), NotifyError> {
            sink.lock().unwrap().push(u.clone());
            Ok(())
        });

        let queue = GenerationQueue::new(
            Arc::new(SqliteJobStore::new(db)),
            vocabulary.clone(),
            Arc::new(notifier),
            3,
        );
        Fixture {
            queue,
            vocabulary,
            updates,
        }
    }

    #[test]
    fn test_enqueue_uses_word_defaults() {
        let f = create_fixture();
        let word = f.vocabulary.insert_word(NewWord::new("gato", "spanish")).unwrap();

        let job = f.queue.enqueue(word.id, EnqueueOptions::default()).unwrap();
        assert_eq!(job.language, "spanish");
        assert_eq!(job.desired_sentence_count, 3);
        assert_eq!(job.status, JobStatus::Queued);

        let status = f.queue.get_status(word.id).unwrap().unwrap();
        assert_eq!(status.processing_status, Some(ProcessingStatus::Queued));
        assert_eq!(status.sentence_count, 0);
    }

    #[test]
    fn test_enqueue_with_overrides() {
        let f = create_fixture();
        let word = f.vocabulary.insert_word(NewWord::new("gato", "spanish")).unwrap();

        let job = f
            .queue
            .enqueue(
                word.id,
                EnqueueOptions {
                    language: Some("catalan".to_string()),
                    topic: Some("pets".to_string()),
                    desired_sentence_count: Some(5),
                },
            )
            .unwrap();
        assert_eq!(job.language, "catalan");
        assert_eq!(job.topic.as_deref(), Some("pets"));
        assert_eq!(job.desired_sentence_count, 5);
    }

    #[test]
    fn test_enqueue_notifies() {
        let f = create_fixture();
        let word = f.vocabulary.insert_word(NewWord::new("gato", "spanish")).unwrap();
        f.queue.enqueue(word.id, EnqueueOptions::default()).unwrap();

        let updates = f.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].processing_status, Some(ProcessingStatus::Queued));
    }

    #[test]
    fn test_enqueue_unknown_word() {
        let f = create_fixture();
        let err = f.queue.enqueue(404, EnqueueOptions::default()).unwrap_err();
        assert!(matches!(err, QueueError::WordNotFound(404)));
        assert!(f.updates.lock().unwrap().is_empty());
    }

    #[test]
    fn test_enqueue_zero_sentences_rejected() {
        let f = create_fixture();
        let word = f.vocabulary.insert_word(NewWord::new("gato", "spanish")).unwrap();
        let err = f
            .queue
            .enqueue(
                word.id,
                EnqueueOptions {
                    desired_sentence_count: Some(0),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, QueueError::InvalidRequest(_)));
    }

    #[test]
    fn test_status_of_unknown_word() {
        let f = create_fixture();
        assert!(f.queue.get_status(1).unwrap().is_none());
        assert!(f.queue.get_job(1).unwrap().is_none());
    }

    #[test]
    fn test_queue_summary_lists_words() {
        let f = create_fixture();
        let a = f.vocabulary.insert_word(NewWord::new("uno", "spanish")).unwrap();
        let b = f.vocabulary.insert_word(NewWord::new("dos", "spanish")).unwrap();
        f.queue.enqueue(a.id, EnqueueOptions::default()).unwrap();
        f.queue.enqueue(b.id, EnqueueOptions::default()).unwrap();

        let summary = f.queue.get_queue_summary(Some("spanish")).unwrap();
        assert_eq!(summary.queued, 2);
        assert_eq!(summary.queued_words.len(), 2);
        assert!(f.queue.get_queue_summary(Some("french")).unwrap().queued_words.is_empty());
    }
}
