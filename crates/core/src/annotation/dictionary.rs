use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use super::AnnotationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub headword: String,
    pub gloss: String,
}

/// Bilingual dictionary lookup.
pub trait Dictionary: Send + Sync {
    fn lookup(&self, language: &str, word: &str)
        -> Result<Option<DictionaryEntry>, AnnotationError>;
}

/// Dictionary held in memory, keyed by language and lower-cased headword.
#[derive(Debug, Default)]
pub struct MemoryDictionary {
    entries: RwLock<HashMap<(String, String), DictionaryEntry>>,
}

impl MemoryDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, language: &str, headword: &str, gloss: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                (language.to_lowercase(), headword.to_lowercase()),
                DictionaryEntry {
                    headword: headword.to_string(),
                    gloss: gloss.to_string(),
                },
            );
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Dictionary for MemoryDictionary {
    fn lookup(
        &self,
        language: &str,
        word: &str,
    ) -> Result<Option<DictionaryEntry>, AnnotationError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AnnotationError::Dictionary("dictionary lock poisoned".to_string()))?;
        Ok(entries
            .get(&(language.to_lowercase(), word.to_lowercase()))
            .cloned())
    }
}
