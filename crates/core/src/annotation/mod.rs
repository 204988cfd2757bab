//! Token annotations for stored sentences.
//!
//! Annotation splits a sentence into word tokens and marks, for each one,
//! whether it is the target word, whether the learner already has it in
//! their vocabulary, and its dictionary gloss. Results are cached on the
//! sentence so the UI can render them without recomputing.

mod annotator;
mod dictionary;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use annotator::{Annotator, DictionaryAnnotator};
pub use dictionary::{Dictionary, DictionaryEntry, MemoryDictionary};

/// One word token of a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    /// Byte offset of the token in the sentence.
    pub start: usize,
    /// Byte offset one past the token's end.
    pub end: usize,
    pub is_target: bool,
    /// Present in the learner's word list for the language.
    pub known: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gloss: Option<String>,
}

#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("Dictionary lookup failed: {0}")]
    Dictionary(String),

    #[error("Nothing to annotate")]
    Empty,
}
