//! Mock annotator and recording notifier for testing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::annotation::{AnnotationError, Annotator, Dictionary, DictionaryAnnotator, Token};
use crate::notifier::{NotifyError, StatusNotifier, WordUpdate};

/// Annotator that delegates to [`DictionaryAnnotator`] unless told to fail.
#[derive(Debug, Default)]
pub struct MockAnnotator {
    inner: DictionaryAnnotator,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockAnnotator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Annotator for MockAnnotator {
    fn annotate(
        &self,
        sentence: &str,
        target_word: &str,
        all_words: &[String],
        dictionary: &dyn Dictionary,
        language: &str,
    ) -> Result<Vec<Token>, AnnotationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AnnotationError::Dictionary("mock annotation failure".to_string()));
        }
        self.inner
            .annotate(sentence, target_word, all_words, dictionary, language)
    }
}

/// Notifier that records every update, optionally failing delivery.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    updates: RwLock<Vec<WordUpdate>>,
    worker_events: RwLock<Vec<bool>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record updates but report every delivery as failed.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn updates(&self) -> Vec<WordUpdate> {
        self.updates.read().map(|u| u.clone()).unwrap_or_default()
    }

    /// Updates for one word, in order.
    pub fn updates_for(&self, word_id: i64) -> Vec<WordUpdate> {
        self.updates()
            .into_iter()
            .filter(|u| u.word_id == word_id)
            .collect()
    }

    /// Worker running changes, in order.
    pub fn worker_events(&self) -> Vec<bool> {
        self.worker_events.read().map(|e| e.clone()).unwrap_or_default()
    }
}

impl StatusNotifier for RecordingNotifier {
    fn notify(&self, update: &WordUpdate) -> Result<(), NotifyError> {
        if let Ok(mut updates) = self.updates.write() {
            updates.push(update.clone());
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery("mock delivery failure".to_string()));
        }
        Ok(())
    }

    fn worker_running_changed(&self, running: bool) -> Result<(), NotifyError> {
        if let Ok(mut events) = self.worker_events.write() {
            events.push(running);
        }
        Ok(())
    }
}
