//! Sentence generator trait and types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::llm::LlmError;

/// What to generate for one word.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub word: String,
    pub language: String,
    pub translation: Option<String>,
    pub topic: Option<String>,
    /// Number of candidates wanted.
    pub count: u32,
    /// Sentences the word already has; candidates should differ from these.
    pub existing: Vec<String>,
}

/// One candidate sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSentence {
    pub text: String,
    #[serde(default)]
    pub translation: Option<String>,
    /// Recorded audio for this sentence, if the source has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_audio_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),
}

/// Source of example sentences.
#[async_trait]
pub trait SentenceGenerator: Send + Sync {
    /// Service name recorded in sentence provenance.
    fn name(&self) -> &str;

    /// Model name recorded in sentence provenance, if any.
    fn model(&self) -> Option<&str>;

    /// Produce up to `request.count` candidate sentences.
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedSentence>, GeneratorError>;
}
