use std::collections::HashSet;

use super::{AnnotationError, Dictionary, Token};

/// Produces token annotations for a sentence.
pub trait Annotator: Send + Sync {
    fn annotate(
        &self,
        sentence: &str,
        target_word: &str,
        all_words: &[String],
        dictionary: &dyn Dictionary,
        language: &str,
    ) -> Result<Vec<Token>, AnnotationError>;
}

/// Annotator that matches tokens against the word list and a dictionary.
///
/// A token matches a word when it is equal ignoring case, or when the word
/// has at least `min_prefix_len` characters and the token starts with it
/// (catches plurals and simple inflections).
#[derive(Debug, Clone)]
pub struct DictionaryAnnotator {
    min_prefix_len: usize,
}

impl Default for DictionaryAnnotator {
    fn default() -> Self {
        Self { min_prefix_len: 4 }
    }
}

impl DictionaryAnnotator {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(&self, token: &str, word: &str) -> bool {
        token == word || (word.chars().count() >= self.min_prefix_len && token.starts_with(word))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\''
}

/// Split into word tokens with byte offsets. Apostrophes only join letters.
fn tokenize(sentence: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in sentence.char_indices() {
        match (start, is_word_char(c)) {
            (None, true) if c != '\'' => start = Some(i),
            (Some(s), false) => {
                spans.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, sentence.len()));
    }

    spans
        .into_iter()
        .map(|(s, e)| {
            let trimmed = sentence[s..e].trim_end_matches('\'');
            (s, s + trimmed.len())
        })
        .collect()
}

impl Annotator for DictionaryAnnotator {
    fn annotate(
        &self,
        sentence: &str,
        target_word: &str,
        all_words: &[String],
        dictionary: &dyn Dictionary,
        language: &str,
    ) -> Result<Vec<Token>, AnnotationError> {
        let spans = tokenize(sentence);
        if spans.is_empty() {
            return Err(AnnotationError::Empty);
        }

        let target = target_word.trim().to_lowercase();
        let known_words: HashSet<String> = all_words.iter().map(|w| w.trim().to_lowercase()).collect();

        let mut tokens = Vec::with_capacity(spans.len());
        for (start, end) in spans {
            let text = &sentence[start..end];
            let lower = text.to_lowercase();

            let is_target = !target.is_empty() && self.matches(&lower, &target);
            let known = is_target
                || known_words.contains(&lower)
                || known_words.iter().any(|w| self.matches(&lower, w));

            let mut gloss = dictionary.lookup(language, &lower)?.map(|e| e.gloss);
            if gloss.is_none() && is_target {
                gloss = dictionary.lookup(language, &target)?.map(|e| e.gloss);
            }

            tokens.push(Token {
                text: text.to_string(),
                start,
                end,
                is_target,
                known,
                gloss,
            });
        }

        Ok(tokens)
    }
}
