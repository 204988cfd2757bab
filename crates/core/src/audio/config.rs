//! Audio configuration.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// `[audio]` section.
///
/// The TTS command is run once per sentence. Arguments are templates with
/// the placeholders `{text}`, `{voice}`, `{language}` and `{output}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioConfig {
    /// TTS binary.
    #[serde(default = "default_command")]
    pub command: PathBuf,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Extension of files the command writes.
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Root directory for audio files; one subdirectory per language.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Voice per language; languages without an entry use `default_voice`,
    /// then the language name itself.
    #[serde(default)]
    pub voices: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_voice: Option<String>,
    /// Timeout for one TTS run, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Timeout for one download, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub download_timeout_secs: u64,
}

fn default_command() -> PathBuf {
    PathBuf::from("espeak-ng")
}

fn default_args() -> Vec<String> {
    ["-v", "{voice}", "-w", "{output}", "{text}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_extension() -> String {
    "wav".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("audio")
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            extension: default_extension(),
            output_dir: default_output_dir(),
            voices: HashMap::new(),
            default_voice: None,
            timeout_secs: default_timeout_secs(),
            download_timeout_secs: default_timeout_secs(),
        }
    }
}
