//! Example sentence sources.
//!
//! A [`SentenceGenerator`] produces candidate sentences for a word. One
//! implementation is selected from configuration at startup:
//!
//! - [`LlmSentenceGenerator`] over [`AnthropicClient`] or [`OllamaClient`]
//! - [`TatoebaSentenceGenerator`] for corpus sentences with recorded audio

mod config;
mod llm;
mod llm_generator;
mod tatoeba;
mod types;

pub use config::{create_sentence_generator, GeneratorConfig, GeneratorProvider};
pub use llm::{
    AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError, LlmUsage,
    OllamaClient,
};
pub use llm_generator::LlmSentenceGenerator;
pub use tatoeba::{tatoeba_language_code, TatoebaSentenceGenerator};
pub use types::{GeneratedSentence, GenerationRequest, GeneratorError, SentenceGenerator};
