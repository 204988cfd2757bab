//! Audio through an external TTS command and HTTP downloads.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::metrics::AUDIO_OPERATIONS;

use super::types::language_dir;
use super::{AudioConfig, AudioError, AudioService};

/// Runs a local TTS binary (espeak-ng by default) and downloads recordings
/// with `reqwest`. Files are named by a SHA-256 of their inputs, so repeated
/// requests reuse the existing file.
pub struct CommandAudioService {
    config: AudioConfig,
    client: reqwest::Client,
}

impl CommandAudioService {
    pub fn new(config: AudioConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, client }
    }

    fn file_name(parts: &[&str], extension: &str) -> String {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        let digest = hasher.finalize();
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        format!("{}.{}", hex, extension)
    }

    fn build_args(&self, text: &str, voice: &str, language: &str, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        self.config
            .args
            .iter()
            .map(|arg| {
                arg.replace("{output}", &output)
                    .replace("{voice}", voice)
                    .replace("{language}", language)
                    .replace("{text}", text)
            })
            .collect()
    }

    /// Extension of a download URL, falling back to mp3.
    fn url_extension(url: &str) -> &str {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        path.rsplit('/')
            .next()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("mp3")
    }

    async fn run_tts(&self, text: &str, voice: &str, language: &str, output: &Path) -> Result<(), AudioError> {
        let args = self.build_args(text, voice, language, output);
        let timeout_secs = self.config.timeout_secs;

        let child = Command::new(&self.config.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AudioError::CommandNotFound {
                        command: self.config.command.clone(),
                    }
                } else {
                    AudioError::Io(e)
                }
            })?;

        let output_result = timeout(Duration::from_secs(timeout_secs), child.wait_with_output())
            .await
            .map_err(|_| AudioError::Timeout { timeout_secs })??;

        if !output_result.status.success() {
            return Err(AudioError::CommandFailed {
                status: output_result.status.to_string(),
                stderr: String::from_utf8_lossy(&output_result.stderr).trim().to_string(),
            });
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(AudioError::MissingOutput {
                path: output.to_path_buf(),
            });
        }

        Ok(())
    }

    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), AudioError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AudioError::Download(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AudioError::Download(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AudioError::Download(e.to_string()))?;
        if bytes.is_empty() {
            return Err(AudioError::Download(format!("{} returned no data", url)));
        }

        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }
}

fn record(operation: &str, ok: bool) {
    AUDIO_OPERATIONS
        .with_label_values(&[operation, if ok { "success" } else { "error" }])
        .inc();
}

#[async_trait]
impl AudioService for CommandAudioService {
    fn name(&self) -> &str {
        self.config
            .command
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("tts")
    }

    fn voice(&self, language: &str) -> Option<String> {
        self.config
            .voices
            .get(language)
            .or(self.config.default_voice.as_ref())
            .cloned()
            .or_else(|| Some(language.to_string()))
    }

    async fn synthesize(
        &self,
        text: &str,
        language: &str,
        word: &str,
    ) -> Result<PathBuf, AudioError> {
        let voice = self.voice(language).unwrap_or_default();
        let dir = language_dir(&self.config.output_dir, language);
        let path = dir.join(Self::file_name(
            &[word, text, &voice],
            &self.config.extension,
        ));

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!(path = %path.display(), "Reusing synthesized audio");
            return Ok(path);
        }

        tokio::fs::create_dir_all(&dir).await?;
        let start = Instant::now();
        let result = self.run_tts(text, &voice, language, &path).await;
        record("synthesize", result.is_ok());

        match result {
            Ok(()) => {
                debug!(
                    path = %path.display(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Synthesized sentence audio"
                );
                Ok(path)
            }
            Err(e) => {
                warn!(language, error = %e, "Speech synthesis failed");
                // Do not leave a partial file to be mistaken for a cached one
                let _ = tokio::fs::remove_file(&path).await;
                Err(e)
            }
        }
    }

    async fn download_from_url(
        &self,
        url: &str,
        _text: &str,
        language: &str,
        word: &str,
    ) -> Result<PathBuf, AudioError> {
        let dir = language_dir(&self.config.output_dir, language);
        let path = dir.join(Self::file_name(&[word, url], Self::url_extension(url)));

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(path);
        }

        tokio::fs::create_dir_all(&dir).await?;
        let result = self.fetch(url, &path).await;
        record("download", result.is_ok());
        result?;

        debug!(url, path = %path.display(), "Downloaded sentence audio");
        Ok(path)
    }
}
