//! Vocabulary storage trait and error type.

use thiserror::Error;

use crate::annotation::Token;
use crate::db::StorageError;

use super::{InsertOutcome, NewSentence, NewWord, ProcessingStatus, Sentence, Word, WordStatus};

/// Error type for vocabulary operations.
#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Word not found: {0}")]
    WordNotFound(i64),

    #[error("Sentence not found: {0}")]
    SentenceNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl VocabularyError {
    /// Whether the vocabulary database itself is unreachable.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, VocabularyError::Storage(e) if e.is_unavailable())
    }
}

impl From<rusqlite::Error> for VocabularyError {
    fn from(err: rusqlite::Error) -> Self {
        VocabularyError::Storage(err.into())
    }
}

/// The narrow slice of word/sentence persistence the generation queue needs.
pub trait VocabularyStore: Send + Sync {
    /// Create a word.
    fn insert_word(&self, word: NewWord) -> Result<Word, VocabularyError>;

    /// Get a word by ID.
    fn get_word(&self, word_id: i64) -> Result<Option<Word>, VocabularyError>;

    /// Delete a word and its sentences. Returns whether a row was removed.
    fn delete_word(&self, word_id: i64) -> Result<bool, VocabularyError>;

    /// The denormalized status pair for a word.
    fn word_status(&self, word_id: i64) -> Result<Option<WordStatus>, VocabularyError>;

    /// Set a word's processing status. Returns the updated pair, or `None`
    /// if the word no longer exists.
    fn set_processing_status(
        &self,
        word_id: i64,
        status: ProcessingStatus,
    ) -> Result<Option<WordStatus>, VocabularyError>;

    /// Texts of every word in a language, used for annotation.
    fn word_texts(&self, language: &str) -> Result<Vec<String>, VocabularyError>;

    /// Sentences of a word, oldest first.
    fn list_sentences(&self, word_id: i64) -> Result<Vec<Sentence>, VocabularyError>;

    /// Insert a sentence and bump the word's cached count in one transaction.
    fn insert_sentence(&self, sentence: NewSentence) -> Result<InsertOutcome, VocabularyError>;

    /// Delete a sentence and decrement the cached count. Returns the new count.
    fn delete_sentence(&self, sentence_id: i64) -> Result<u32, VocabularyError>;

    /// Attach an audio file to an existing sentence.
    fn set_sentence_audio(
        &self,
        sentence_id: i64,
        audio_path: &str,
        audio_service: &str,
        audio_model: Option<&str>,
    ) -> Result<(), VocabularyError>;

    /// Cache the annotation tokens of a sentence.
    fn save_annotations(&self, sentence_id: i64, tokens: &[Token]) -> Result<(), VocabularyError>;
}
