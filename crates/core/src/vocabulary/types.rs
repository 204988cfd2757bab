//! Word and sentence types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::annotation::Token;

/// Word-level summary of where its generation job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Queued,
    Processing,
    Ready,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Queued => "queued",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Ready => "ready",
            ProcessingStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queued" => Ok(ProcessingStatus::Queued),
            "processing" => Ok(ProcessingStatus::Processing),
            "ready" => Ok(ProcessingStatus::Ready),
            "failed" => Ok(ProcessingStatus::Failed),
            _ => Err(format!("Invalid processing status: {}", s)),
        }
    }
}

/// A vocabulary word.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    pub id: i64,
    pub text: String,
    pub language: String,
    pub translation: Option<String>,
    /// Unset until the word is first enqueued.
    pub processing_status: Option<ProcessingStatus>,
    /// Cached number of stored sentences.
    pub sentence_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Word {
    pub fn status(&self) -> WordStatus {
        WordStatus {
            word_id: self.id,
            processing_status: self.processing_status,
            sentence_count: self.sentence_count,
        }
    }
}

/// The denormalized status pair readers use to learn a word's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordStatus {
    pub word_id: i64,
    pub processing_status: Option<ProcessingStatus>,
    pub sentence_count: u32,
}

/// Request to create a word.
#[derive(Debug, Clone)]
pub struct NewWord {
    pub text: String,
    pub language: String,
    pub translation: Option<String>,
}

impl NewWord {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
            translation: None,
        }
    }

    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self
    }
}

/// Which service produced a sentence's text and audio.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub text_service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_model: Option<String>,
}

/// An example sentence attached to a word.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentence {
    pub id: i64,
    pub word_id: i64,
    pub text: String,
    pub normalized_text: String,
    pub translation: Option<String>,
    pub audio_path: Option<String>,
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<Token>>,
    pub created_at: DateTime<Utc>,
}

/// A sentence ready to be stored.
#[derive(Debug, Clone)]
pub struct NewSentence {
    pub word_id: i64,
    pub text: String,
    pub translation: Option<String>,
    pub audio_path: Option<String>,
    pub provenance: Provenance,
}

/// Result of inserting a sentence.
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    /// Stored; carries the word's new cached sentence count.
    Inserted {
        sentence: Sentence,
        sentence_count: u32,
    },
    /// A sentence with the same normalized text already exists for the word.
    Duplicate,
}

/// Normalize sentence text for duplicate detection: trimmed, lower-cased,
/// internal whitespace collapsed to single spaces.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Hola   Mundo \n"), "hola mundo");
        assert_eq!(normalize_text("Él\tcome\u{00A0} pan"), "él come pan");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_normalize_collides_near_identical() {
        assert_eq!(
            normalize_text("El gato duerme."),
            normalize_text(" el  GATO duerme. ")
        );
        assert_ne!(
            normalize_text("El gato duerme."),
            normalize_text("El gato duerme")
        );
    }

    #[test]
    fn test_processing_status_round_trip() {
        for status in [
            ProcessingStatus::Queued,
            ProcessingStatus::Processing,
            ProcessingStatus::Ready,
            ProcessingStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<ProcessingStatus>().unwrap(), status);
        }
        assert_eq!("READY".parse::<ProcessingStatus>().unwrap(), ProcessingStatus::Ready);
        assert!("done".parse::<ProcessingStatus>().is_err());
    }

    #[test]
    fn test_processing_status_serializes_lowercase() {
        let json = serde_json::to_string(&ProcessingStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }
}
