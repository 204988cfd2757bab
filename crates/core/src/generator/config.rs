//! Sentence generator configuration and construction.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::llm::{AnthropicClient, OllamaClient};
use super::{GeneratorError, LlmSentenceGenerator, SentenceGenerator, TatoebaSentenceGenerator};

/// Sentence source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorProvider {
    /// Anthropic Claude API.
    Anthropic,
    /// Local Ollama instance.
    Ollama,
    /// Tatoeba corpus (sentences with native recordings).
    Tatoeba,
}

impl GeneratorProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorProvider::Anthropic => "anthropic",
            GeneratorProvider::Ollama => "ollama",
            GeneratorProvider::Tatoeba => "tatoeba",
        }
    }

    pub fn is_llm(&self) -> bool {
        matches!(self, GeneratorProvider::Anthropic | GeneratorProvider::Ollama)
    }
}

/// `[generator]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorConfig {
    pub provider: GeneratorProvider,
    /// Model name (required for LLM providers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// API key (required for Anthropic).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom API base URL (for proxies or self-hosted).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_timeout() -> u32 {
    60
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

/// Build the configured sentence generator.
pub fn create_sentence_generator(
    config: &GeneratorConfig,
) -> Result<Arc<dyn SentenceGenerator>, GeneratorError> {
    let timeout = Duration::from_secs(config.timeout_secs as u64);

    let generator: Arc<dyn SentenceGenerator> = match config.provider {
        GeneratorProvider::Anthropic => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                GeneratorError::NotConfigured("anthropic provider requires api_key".to_string())
            })?;
            let model = require_model(config)?;
            let mut client = AnthropicClient::new(api_key, model).with_timeout(timeout);
            if let Some(ref api_base) = config.api_base {
                client = client.with_api_base(api_base.clone());
            }
            info!("Sentence generation via Anthropic ({})", model);
            Arc::new(
                LlmSentenceGenerator::new(Arc::new(client))
                    .with_temperature(config.temperature)
                    .with_max_tokens(config.max_tokens),
            )
        }
        GeneratorProvider::Ollama => {
            let model = require_model(config)?;
            let mut client = OllamaClient::new(model).with_timeout(timeout);
            if let Some(ref api_base) = config.api_base {
                client = client.with_api_base(api_base.clone());
            }
            info!("Sentence generation via Ollama ({})", model);
            Arc::new(
                LlmSentenceGenerator::new(Arc::new(client))
                    .with_temperature(config.temperature)
                    .with_max_tokens(config.max_tokens),
            )
        }
        GeneratorProvider::Tatoeba => {
            let mut generator = TatoebaSentenceGenerator::new(timeout);
            if let Some(ref api_base) = config.api_base {
                generator = generator.with_api_base(api_base.clone());
            }
            info!("Sentence generation via Tatoeba");
            Arc::new(generator)
        }
    };

    Ok(generator)
}

fn require_model(config: &GeneratorConfig) -> Result<&str, GeneratorError> {
    config
        .model
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| {
            GeneratorError::NotConfigured(format!(
                "{} provider requires a model",
                config.provider.as_str()
            ))
        })
}
