use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::audio::AudioConfig;
use crate::generator::GeneratorConfig;
use crate::worker::WorkerConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("phrasebook.db")
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub worker: WorkerConfig,
    pub generator: SanitizedGeneratorConfig,
    pub audio: SanitizedAudioConfig,
}

/// Sanitized generator config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedGeneratorConfig {
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAudioConfig {
    pub command: String,
    pub extension: String,
    pub output_dir: String,
    pub languages: Vec<String>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let mut languages: Vec<String> = config.audio.voices.keys().cloned().collect();
        languages.sort();

        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            worker: config.worker.clone(),
            generator: SanitizedGeneratorConfig {
                provider: config.generator.provider.as_str().to_string(),
                model: config.generator.model.clone(),
                api_base: config.generator.api_base.clone(),
                api_key_configured: config.generator.api_key.is_some(),
                timeout_secs: config.generator.timeout_secs,
            },
            audio: SanitizedAudioConfig {
                command: config.audio.command.display().to_string(),
                extension: config.audio.extension.clone(),
                output_dir: config.audio.output_dir.display().to_string(),
                languages,
            },
        }
    }
}
