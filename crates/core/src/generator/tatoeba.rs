//! Example sentences from the Tatoeba corpus.
//!
//! Tatoeba sentences are human-written and many carry a native-speaker
//! recording, so candidates returned here come with a `source_audio_url` and
//! the pipeline downloads that instead of synthesizing speech.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::metrics::record_external_call;
use crate::vocabulary::normalize_text;

use super::{GeneratedSentence, GenerationRequest, GeneratorError, SentenceGenerator};

const DEFAULT_API_BASE: &str = "https://tatoeba.org";
const AUDIO_BASE: &str = "https://audio.tatoeba.org/sentences";

/// Map a language name or ISO 639-1 code to Tatoeba's ISO 639-3 code.
pub fn tatoeba_language_code(language: &str) -> Option<&'static str> {
    let code = match language.trim().to_lowercase().as_str() {
        "english" | "en" | "eng" => "eng",
        "spanish" | "es" | "spa" => "spa",
        "french" | "fr" | "fra" => "fra",
        "german" | "de" | "deu" => "deu",
        "italian" | "it" | "ita" => "ita",
        "portuguese" | "pt" | "por" => "por",
        "dutch" | "nl" | "nld" => "nld",
        "russian" | "ru" | "rus" => "rus",
        "japanese" | "ja" | "jpn" => "jpn",
        "korean" | "ko" | "kor" => "kor",
        "chinese" | "mandarin" | "zh" | "cmn" => "cmn",
        "catalan" | "ca" | "cat" => "cat",
        "polish" | "pl" | "pol" => "pol",
        "turkish" | "tr" | "tur" => "tur",
        "swedish" | "sv" | "swe" => "swe",
        "finnish" | "fi" | "fin" => "fin",
        "ukrainian" | "uk" | "ukr" => "ukr",
        "hungarian" | "hu" | "hun" => "hun",
        _ => return None,
    };
    Some(code)
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: i64,
    text: String,
    lang: String,
    #[serde(default)]
    translations: Vec<Vec<Translation>>,
    #[serde(default)]
    audios: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
    lang: String,
}

/// Sentence source backed by the Tatoeba search API.
pub struct TatoebaSentenceGenerator {
    client: reqwest::Client,
    api_base: String,
    translation_language: String,
}

impl TatoebaSentenceGenerator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            api_base: DEFAULT_API_BASE.to_string(),
            translation_language: "eng".to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn search_url(&self, language_code: &str, word: &str) -> String {
        format!(
            "{}/en/api_v0/search?from={}&query={}&to={}&has_audio=yes&orphans=no&unapproved=no&sort=random",
            self.api_base.trim_end_matches('/'),
            language_code,
            urlencoding::encode(word),
            self.translation_language,
        )
    }

    /// Turn a search response into candidates, skipping sentences the word
    /// already has and repeats within the response.
    fn select(
        &self,
        response: SearchResponse,
        request: &GenerationRequest,
    ) -> Vec<GeneratedSentence> {
        let mut seen: HashSet<String> = request.existing.iter().map(|s| normalize_text(s)).collect();
        let mut selected = Vec::new();

        for result in response.results {
            if selected.len() >= request.count as usize {
                break;
            }
            if !seen.insert(normalize_text(&result.text)) {
                continue;
            }

            let translation = result
                .translations
                .iter()
                .flatten()
                .find(|t| t.lang == self.translation_language)
                .map(|t| t.text.clone());
            let source_audio_url = if result.audios.is_empty() {
                None
            } else {
                Some(format!("{}/{}/{}.mp3", AUDIO_BASE, result.lang, result.id))
            };

            selected.push(GeneratedSentence {
                text: result.text,
                translation,
                source_audio_url,
            });
        }

        selected
    }
}

#[async_trait]
impl SentenceGenerator for TatoebaSentenceGenerator {
    fn name(&self) -> &str {
        "tatoeba"
    }

    fn model(&self) -> Option<&str> {
        None
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedSentence>, GeneratorError> {
        let code = tatoeba_language_code(&request.language)
            .ok_or_else(|| GeneratorError::UnsupportedLanguage(request.language.clone()))?;
        let url = self.search_url(code, &request.word);

        let start = Instant::now();
        let result = self.client.get(&url).send().await;
        let response = match result {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                record_external_call("tatoeba", "search", start.elapsed().as_secs_f64(), false);
                return Err(GeneratorError::Http(format!(
                    "Tatoeba returned {}",
                    response.status()
                )));
            }
            Err(e) => {
                record_external_call("tatoeba", "search", start.elapsed().as_secs_f64(), false);
                return Err(GeneratorError::Http(e.to_string()));
            }
        };

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;
        record_external_call("tatoeba", "search", start.elapsed().as_secs_f64(), true);

        debug!(word = %request.word, results = body.results.len(), "Tatoeba search complete");
        Ok(self.select(body, request))
    }
}
