//! Audio service trait and error type.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while producing sentence audio.
#[derive(Debug, Error)]
pub enum AudioError {
    /// TTS binary not found.
    #[error("TTS command not found: {command}")]
    CommandNotFound { command: PathBuf },

    /// TTS process exited unsuccessfully.
    #[error("TTS command failed ({status}): {stderr}")]
    CommandFailed { status: String, stderr: String },

    #[error("TTS command timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// TTS process succeeded but produced no file.
    #[error("No audio written to {path}")]
    MissingOutput { path: PathBuf },

    #[error("Download failed: {0}")]
    Download(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Speech synthesis and audio download.
#[async_trait]
pub trait AudioService: Send + Sync {
    /// Service name recorded in sentence provenance.
    fn name(&self) -> &str;

    /// Voice used for a language, recorded as the audio model.
    fn voice(&self, language: &str) -> Option<String>;

    /// Synthesize `text` and return the path of the audio file.
    async fn synthesize(&self, text: &str, language: &str, word: &str)
        -> Result<PathBuf, AudioError>;

    /// Download a recording and return the path of the stored file.
    async fn download_from_url(
        &self,
        url: &str,
        text: &str,
        language: &str,
        word: &str,
    ) -> Result<PathBuf, AudioError>;
}

/// Directory-safe form of a language name.
pub(crate) fn language_dir(root: &Path, language: &str) -> PathBuf {
    let safe: String = language
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    root.join(if safe.is_empty() { "unknown".to_string() } else { safe })
}
