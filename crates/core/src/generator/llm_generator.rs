//! Example sentences written by an LLM.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use regex_lite::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::metrics::record_external_call;
use crate::vocabulary::normalize_text;

use super::llm::{CompletionRequest, LlmClient};
use super::{GeneratedSentence, GenerationRequest, GeneratorError, SentenceGenerator};

const SYSTEM_PROMPT: &str = "You write short, natural example sentences for language learners. \
Each sentence must use the target word in context and be appropriate for an intermediate learner. \
Respond with JSON only: {\"sentences\": [{\"text\": \"...\", \"translation\": \"...\"}]}. \
The translation is in English.";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SentenceList {
    Wrapped { sentences: Vec<LlmSentence> },
    Bare(Vec<LlmSentence>),
}

#[derive(Debug, Deserialize)]
struct LlmSentence {
    text: String,
    #[serde(default)]
    translation: Option<String>,
}

/// Sentence generator backed by an [`LlmClient`].
pub struct LlmSentenceGenerator {
    client: Arc<dyn LlmClient>,
    temperature: f32,
    max_tokens: u32,
}

impl LlmSentenceGenerator {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            temperature: 0.7,
            max_tokens: 1024,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_prompt(request: &GenerationRequest) -> String {
        let mut prompt = format!(
            "Write {} different example sentences in {} using the word \"{}\"",
            request.count, request.language, request.word
        );
        if let Some(ref translation) = request.translation {
            prompt.push_str(&format!(" (meaning: {})", translation));
        }
        prompt.push('.');
        if let Some(ref topic) = request.topic {
            prompt.push_str(&format!("\nThe sentences should relate to the topic: {}.", topic));
        }
        if !request.existing.is_empty() {
            prompt.push_str("\nDo not repeat any of these existing sentences:");
            for sentence in &request.existing {
                prompt.push_str(&format!("\n- {}", sentence));
            }
        }
        prompt
    }
}

/// Extract the sentence list from a model response, tolerating prose or code
/// fences around the JSON.
fn parse_sentences(text: &str) -> Result<Vec<LlmSentence>, GeneratorError> {
    let trimmed = text.trim();
    if let Ok(list) = serde_json::from_str::<SentenceList>(trimmed) {
        return Ok(list.into_vec());
    }

    for pattern in [r"(?s)\{.*\}", r"(?s)\[.*\]"] {
        let re = Regex::new(pattern).map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;
        if let Some(m) = re.find(trimmed) {
            if let Ok(list) = serde_json::from_str::<SentenceList>(m.as_str()) {
                return Ok(list.into_vec());
            }
        }
    }

    Err(GeneratorError::InvalidResponse(format!(
        "no sentence list in response: {}",
        trimmed.chars().take(200).collect::<String>()
    )))
}

impl SentenceList {
    fn into_vec(self) -> Vec<LlmSentence> {
        match self {
            SentenceList::Wrapped { sentences } => sentences,
            SentenceList::Bare(sentences) => sentences,
        }
    }
}

#[async_trait]
impl SentenceGenerator for LlmSentenceGenerator {
    fn name(&self) -> &str {
        self.client.provider()
    }

    fn model(&self) -> Option<&str> {
        Some(self.client.model())
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedSentence>, GeneratorError> {
        let completion = CompletionRequest::new(Self::build_prompt(request))
            .with_system(SYSTEM_PROMPT)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        let start = Instant::now();
        let result = self.client.complete(completion).await;
        record_external_call(
            self.client.provider(),
            "generate_sentences",
            start.elapsed().as_secs_f64(),
            result.is_ok(),
        );
        let response = result?;

        debug!(
            word = %request.word,
            model = %response.model,
            output_tokens = response.usage.output_tokens,
            "LLM returned sentence candidates"
        );

        let sentences = parse_sentences(&response.text)?
            .into_iter()
            .filter(|s| !normalize_text(&s.text).is_empty())
            .map(|s| GeneratedSentence {
                text: s.text.trim().to_string(),
                translation: s.translation.filter(|t| !t.trim().is_empty()),
                source_audio_url: None,
            })
            .collect();

        Ok(sentences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::llm::{CompletionResponse, LlmError, LlmUsage};
    use std::sync::Mutex;

    struct ScriptedClient {
        reply: Result<String, u16>,
        prompts: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedClient {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        fn provider(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-1"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.prompts.lock().unwrap().push(request);
            match &self.reply {
                Ok(text) => Ok(CompletionResponse {
                    text: text.clone(),
                    usage: LlmUsage::default(),
                    model: "scripted-1".to_string(),
                }),
                Err(status) => Err(LlmError::Api {
                    status: *status,
                    message: "overloaded".to_string(),
                }),
            }
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            word: "gato".to_string(),
            language: "spanish".to_string(),
            translation: Some("cat".to_string()),
            topic: Some("pets".to_string()),
            count: 2,
            existing: vec!["El gato duerme.".to_string()],
        }
    }

    #[tokio::test]
    async fn test_generate_parses_wrapped_list() {
        let client = Arc::new(ScriptedClient::replying(
            r#"{"sentences": [{"text": "Mi gato es negro.", "translation": "My cat is black."}, {"text": "  ", "translation": ""}]}"#,
        ));
        let generator = LlmSentenceGenerator::new(client.clone());

        let sentences = generator.generate(&request()).await.unwrap();
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].text, "Mi gato es negro.");
        assert_eq!(sentences[0].translation.as_deref(), Some("My cat is black."));
        assert!(sentences[0].source_audio_url.is_none());

        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[0].prompt.contains("\"gato\""));
        assert!(prompts[0].prompt.contains("pets"));
        assert!(prompts[0].prompt.contains("El gato duerme."));
    }

    #[tokio::test]
    async fn test_generate_tolerates_code_fence() {
        let client = Arc::new(ScriptedClient::replying(
            "Here you go:\n```json\n[{\"text\": \"El gato come.\"}]\n```",
        ));
        let generator = LlmSentenceGenerator::new(client);

        let sentences = generator.generate(&request()).await.unwrap();
        assert_eq!(sentences.len(), 1);
        assert!(sentences[0].translation.is_none());
    }

    #[tokio::test]
    async fn test_generate_invalid_response() {
        let client = Arc::new(ScriptedClient::replying("I cannot help with that."));
        let generator = LlmSentenceGenerator::new(client);

        let err = generator.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_generate_api_error() {
        let client = Arc::new(ScriptedClient {
            reply: Err(529),
            prompts: Mutex::new(Vec::new()),
        });
        let generator = LlmSentenceGenerator::new(client);

        let err = generator.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GeneratorError::Llm(LlmError::Api { status: 529, .. })));
    }

    #[test]
    fn test_provenance_names() {
        let generator = LlmSentenceGenerator::new(Arc::new(ScriptedClient::replying("[]")));
        assert_eq!(generator.name(), "scripted");
        assert_eq!(generator.model(), Some("scripted-1"));
    }
}
