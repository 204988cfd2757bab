//! Words and their example sentences.
//!
//! Only the narrow slice the generation queue needs: word lookup, the
//! denormalized `processing_status`/`sentence_count` pair, sentence insertion
//! with transactional count maintenance, audio attachment and the annotation
//! cache.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteVocabularyStore;
pub use store::{VocabularyError, VocabularyStore};
pub use types::{
    normalize_text, InsertOutcome, NewSentence, NewWord, ProcessingStatus, Provenance, Sentence,
    Word, WordStatus,
};
