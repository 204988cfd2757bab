//! Mock audio service for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::audio::{AudioError, AudioService};

/// A recorded audio operation for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedAudio {
    Synthesized { text: String, language: String },
    Downloaded { url: String, text: String },
}

/// Mock implementation of the AudioService trait.
///
/// Returns fake paths without touching the filesystem.
#[derive(Debug, Clone)]
pub struct MockAudioService {
    operations: Arc<RwLock<Vec<RecordedAudio>>>,
    fail_synthesis: Arc<RwLock<bool>>,
    fail_downloads: Arc<RwLock<bool>>,
}

impl Default for MockAudioService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAudioService {
    pub fn new() -> Self {
        Self {
            operations: Arc::new(RwLock::new(Vec::new())),
            fail_synthesis: Arc::new(RwLock::new(false)),
            fail_downloads: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn recorded_operations(&self) -> Vec<RecordedAudio> {
        self.operations.read().await.clone()
    }

    pub async fn synthesized_count(&self) -> usize {
        self.operations
            .read()
            .await
            .iter()
            .filter(|op| matches!(op, RecordedAudio::Synthesized { .. }))
            .count()
    }

    pub async fn set_fail_synthesis(&self, fail: bool) {
        *self.fail_synthesis.write().await = fail;
    }

    pub async fn set_fail_downloads(&self, fail: bool) {
        *self.fail_downloads.write().await = fail;
    }
}

#[async_trait]
impl AudioService for MockAudioService {
    fn name(&self) -> &str {
        "mock-tts"
    }

    fn voice(&self, language: &str) -> Option<String> {
        Some(format!("{}-voice", language))
    }

    async fn synthesize(
        &self,
        text: &str,
        language: &str,
        _word: &str,
    ) -> Result<PathBuf, AudioError> {
        if *self.fail_synthesis.read().await {
            return Err(AudioError::CommandFailed {
                status: "exit status: 1".to_string(),
                stderr: "mock synthesis failure".to_string(),
            });
        }
        let mut operations = self.operations.write().await;
        operations.push(RecordedAudio::Synthesized {
            text: text.to_string(),
            language: language.to_string(),
        });
        Ok(PathBuf::from(format!("/mock/audio/{}/{}.wav", language, operations.len())))
    }

    async fn download_from_url(
        &self,
        url: &str,
        text: &str,
        language: &str,
        _word: &str,
    ) -> Result<PathBuf, AudioError> {
        if *self.fail_downloads.read().await {
            return Err(AudioError::Download(format!("{} returned 404 Not Found", url)));
        }
        let mut operations = self.operations.write().await;
        operations.push(RecordedAudio::Downloaded {
            url: url.to_string(),
            text: text.to_string(),
        });
        Ok(PathBuf::from(format!("/mock/audio/{}/{}.mp3", language, operations.len())))
    }
}
