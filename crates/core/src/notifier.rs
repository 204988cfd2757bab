//! Word status change notifications.
//!
//! The worker and the queue API report every change to a word's
//! `processing_status` or `sentence_count` through a [`StatusNotifier`]; the
//! worker also reports when its loop starts and stops. Delivery is
//! fire-and-forget: [`notify_safely`] and [`notify_worker_safely`] swallow
//! errors and panics so a broken subscriber can never affect job processing.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vocabulary::{ProcessingStatus, WordStatus};

/// Push event describing a word's current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordUpdate {
    pub word_id: i64,
    pub processing_status: Option<ProcessingStatus>,
    pub sentence_count: u32,
}

impl From<WordStatus> for WordUpdate {
    fn from(status: WordStatus) -> Self {
        Self {
            word_id: status.word_id,
            processing_status: status.processing_status,
            sentence_count: status.sentence_count,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Receiver of word status changes.
pub trait StatusNotifier: Send + Sync {
    fn notify(&self, update: &WordUpdate) -> Result<(), NotifyError>;

    /// The worker loop started (`true`) or exited (`false`), including when
    /// it stops on its own after an infrastructure error.
    fn worker_running_changed(&self, _running: bool) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Deliver an update, logging and discarding any error or panic.
pub fn notify_safely(notifier: &dyn StatusNotifier, update: &WordUpdate) {
    match catch_unwind(AssertUnwindSafe(|| notifier.notify(update))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(word_id = update.word_id, error = %e, "Status notification failed");
        }
        Err(_) => {
            tracing::error!(word_id = update.word_id, "Status notifier panicked");
        }
    }
}

/// Report a worker running change, logging and discarding any error or panic.
pub fn notify_worker_safely(notifier: &dyn StatusNotifier, running: bool) {
    match catch_unwind(AssertUnwindSafe(|| notifier.worker_running_changed(running))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(running, error = %e, "Worker status notification failed");
        }
        Err(_) => {
            tracing::error!(running, "Status notifier panicked on worker status");
        }
    }
}

/// Notifier backed by a closure.
pub struct CallbackNotifier<F>
where
    F: Fn(&WordUpdate) -> Result<(), NotifyError> + Send + Sync,
{
    callback: F,
}

impl<F> CallbackNotifier<F>
where
    F: Fn(&WordUpdate) -> Result<(), NotifyError> + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> StatusNotifier for CallbackNotifier<F>
where
    F: Fn(&WordUpdate) -> Result<(), NotifyError> + Send + Sync,
{
    fn notify(&self, update: &WordUpdate) -> Result<(), NotifyError> {
        (self.callback)(update)
    }
}

/// Notifier that drops every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl StatusNotifier for NoopNotifier {
    fn notify(&self, _update: &WordUpdate) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn update() -> WordUpdate {
        WordUpdate {
            word_id: 1,
            processing_status: Some(ProcessingStatus::Ready),
            sentence_count: 3,
        }
    }

    #[test]
    fn test_callback_receives_update() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let notifier = CallbackNotifier::new(move |u: &WordUpdate| {
            sink.lock().unwrap().push(u.clone());
            Ok(())
        });

        notify_safely(&notifier, &update());
        assert_eq!(seen.lock().unwrap().as_slice(), &[update()]);
    }

    #[test]
    fn test_error_is_swallowed() {
        let notifier = CallbackNotifier::new(|_: &WordUpdate| {
            Err(NotifyError::Delivery("no listeners".to_string()))
        });
        notify_safely(&notifier, &update());
    }

    #[test]
    fn test_panic_is_swallowed() {
        let notifier = CallbackNotifier::new(|_: &WordUpdate| -> Result<(), NotifyError> {
            panic!("subscriber bug")
        });
        notify_safely(&notifier, &update());
    }

    #[test]
    fn test_worker_status_defaults_to_noop() {
        let notifier = CallbackNotifier::new(|_: &WordUpdate| -> Result<(), NotifyError> {
            panic!("word callback must not run")
        });
        assert!(notifier.worker_running_changed(false).is_ok());
        notify_worker_safely(&notifier, true);
    }

    #[test]
    fn test_word_update_serialization() {
        let json = serde_json::to_value(update()).unwrap();
        assert_eq!(json["word_id"], 1);
        assert_eq!(json["processing_status"], "ready");
        assert_eq!(json["sentence_count"], 3);
    }
}
