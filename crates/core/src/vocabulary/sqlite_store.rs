//! SQLite-backed vocabulary store.

use rusqlite::{params, OptionalExtension};

use crate::annotation::Token;
use crate::db::{from_ms, now_ms, Database};

use super::{
    normalize_text, InsertOutcome, NewSentence, NewWord, ProcessingStatus, Provenance, Sentence,
    VocabularyError, VocabularyStore, Word, WordStatus,
};

const WORD_COLUMNS: &str = "id, text, language, translation, processing_status, sentence_count, created_at_ms, updated_at_ms";

const SENTENCE_COLUMNS: &str = "id, word_id, text, normalized_text, translation, audio_path, text_service, text_model, audio_service, audio_model, annotations, created_at_ms";

/// Vocabulary store over the shared application database.
#[derive(Clone)]
pub struct SqliteVocabularyStore {
    db: Database,
}

impl SqliteVocabularyStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_word(row: &rusqlite::Row) -> rusqlite::Result<Word> {
        let status: Option<String> = row.get(4)?;
        Ok(Word {
            id: row.get(0)?,
            text: row.get(1)?,
            language: row.get(2)?,
            translation: row.get(3)?,
            processing_status: status.and_then(|s| s.parse().ok()),
            sentence_count: row.get(5)?,
            created_at: from_ms(row.get(6)?),
            updated_at: from_ms(row.get(7)?),
        })
    }

    fn row_to_sentence(row: &rusqlite::Row) -> rusqlite::Result<Sentence> {
        let annotations_json: Option<String> = row.get(10)?;
        // A cache entry that no longer parses is treated as absent
        let annotations = annotations_json.and_then(|json| serde_json::from_str(&json).ok());

        Ok(Sentence {
            id: row.get(0)?,
            word_id: row.get(1)?,
            text: row.get(2)?,
            normalized_text: row.get(3)?,
            translation: row.get(4)?,
            audio_path: row.get(5)?,
            provenance: Provenance {
                text_service: row.get(6)?,
                text_model: row.get(7)?,
                audio_service: row.get(8)?,
                audio_model: row.get(9)?,
            },
            annotations,
            created_at: from_ms(row.get(11)?),
        })
    }

    fn read_status(
        conn: &rusqlite::Connection,
        word_id: i64,
    ) -> Result<Option<WordStatus>, VocabularyError> {
        let status = conn
            .query_row(
                "SELECT processing_status, sentence_count FROM words WHERE id = ?",
                params![word_id],
                |row| {
                    let status: Option<String> = row.get(0)?;
                    Ok(WordStatus {
                        word_id,
                        processing_status: status.and_then(|s| s.parse().ok()),
                        sentence_count: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(status)
    }
}

impl VocabularyStore for SqliteVocabularyStore {
    fn insert_word(&self, word: NewWord) -> Result<Word, VocabularyError> {
        let conn = self.db.lock()?;
        let now = now_ms();

        conn.execute(
            "INSERT INTO words (text, language, translation, processing_status, sentence_count, created_at_ms, updated_at_ms) VALUES (?, ?, ?, NULL, 0, ?, ?)",
            params![word.text, word.language, word.translation, now, now],
        )?;

        Ok(Word {
            id: conn.last_insert_rowid(),
            text: word.text,
            language: word.language,
            translation: word.translation,
            processing_status: None,
            sentence_count: 0,
            created_at: from_ms(now),
            updated_at: from_ms(now),
        })
    }

    fn get_word(&self, word_id: i64) -> Result<Option<Word>, VocabularyError> {
        let conn = self.db.lock()?;
        let word = conn
            .query_row(
                &format!("SELECT {} FROM words WHERE id = ?", WORD_COLUMNS),
                params![word_id],
                Self::row_to_word,
            )
            .optional()?;
        Ok(word)
    }

    fn delete_word(&self, word_id: i64) -> Result<bool, VocabularyError> {
        let conn = self.db.lock()?;
        let removed = conn.execute("DELETE FROM words WHERE id = ?", params![word_id])?;
        Ok(removed > 0)
    }

    fn word_status(&self, word_id: i64) -> Result<Option<WordStatus>, VocabularyError> {
        let conn = self.db.lock()?;
        Self::read_status(&conn, word_id)
    }

    fn set_processing_status(
        &self,
        word_id: i64,
        status: ProcessingStatus,
    ) -> Result<Option<WordStatus>, VocabularyError> {
        let conn = self.db.lock()?;
        let updated = conn.execute(
            "UPDATE words SET processing_status = ?, updated_at_ms = ? WHERE id = ?",
            params![status.as_str(), now_ms(), word_id],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        Self::read_status(&conn, word_id)
    }

    fn word_texts(&self, language: &str) -> Result<Vec<String>, VocabularyError> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare("SELECT text FROM words WHERE language = ? ORDER BY id")?;
        let texts = stmt
            .query_map(params![language], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(texts)
    }

    fn list_sentences(&self, word_id: i64) -> Result<Vec<Sentence>, VocabularyError> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sentences WHERE word_id = ? ORDER BY id",
            SENTENCE_COLUMNS
        ))?;
        let sentences = stmt
            .query_map(params![word_id], Self::row_to_sentence)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sentences)
    }

    fn insert_sentence(&self, sentence: NewSentence) -> Result<InsertOutcome, VocabularyError> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        let now = now_ms();
        let normalized = normalize_text(&sentence.text);

        let exists: Option<i64> = tx
            .query_row(
                "SELECT id FROM words WHERE id = ?",
                params![sentence.word_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(VocabularyError::WordNotFound(sentence.word_id));
        }

        let inserted = tx.execute(
            "INSERT INTO sentences (word_id, text, normalized_text, translation, audio_path, text_service, text_model, audio_service, audio_model, annotations, created_at_ms)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?)
             ON CONFLICT(word_id, normalized_text) DO NOTHING",
            params![
                sentence.word_id,
                sentence.text,
                normalized,
                sentence.translation,
                sentence.audio_path,
                sentence.provenance.text_service,
                sentence.provenance.text_model,
                sentence.provenance.audio_service,
                sentence.provenance.audio_model,
                now,
            ],
        )?;
        if inserted == 0 {
            return Ok(InsertOutcome::Duplicate);
        }
        let sentence_id = tx.last_insert_rowid();

        tx.execute(
            "UPDATE words SET sentence_count = sentence_count + 1, updated_at_ms = ? WHERE id = ?",
            params![now, sentence.word_id],
        )?;
        let sentence_count: u32 = tx.query_row(
            "SELECT sentence_count FROM words WHERE id = ?",
            params![sentence.word_id],
            |row| row.get(0),
        )?;
        tx.commit()?;

        Ok(InsertOutcome::Inserted {
            sentence: Sentence {
                id: sentence_id,
                word_id: sentence.word_id,
                text: sentence.text,
                normalized_text: normalized,
                translation: sentence.translation,
                audio_path: sentence.audio_path,
                provenance: sentence.provenance,
                annotations: None,
                created_at: from_ms(now),
            },
            sentence_count,
        })
    }

    fn delete_sentence(&self, sentence_id: i64) -> Result<u32, VocabularyError> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;

        let word_id: i64 = tx
            .query_row(
                "SELECT word_id FROM sentences WHERE id = ?",
                params![sentence_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(VocabularyError::SentenceNotFound(sentence_id))?;

        tx.execute("DELETE FROM sentences WHERE id = ?", params![sentence_id])?;
        tx.execute(
            "UPDATE words SET sentence_count = MAX(sentence_count - 1, 0), updated_at_ms = ? WHERE id = ?",
            params![now_ms(), word_id],
        )?;
        let sentence_count: u32 = tx.query_row(
            "SELECT sentence_count FROM words WHERE id = ?",
            params![word_id],
            |row| row.get(0),
        )?;
        tx.commit()?;

        Ok(sentence_count)
    }

    fn set_sentence_audio(
        &self,
        sentence_id: i64,
        audio_path: &str,
        audio_service: &str,
        audio_model: Option<&str>,
    ) -> Result<(), VocabularyError> {
        let conn = self.db.lock()?;
        let updated = conn.execute(
            "UPDATE sentences SET audio_path = ?, audio_service = ?, audio_model = ? WHERE id = ?",
            params![audio_path, audio_service, audio_model, sentence_id],
        )?;
        if updated == 0 {
            return Err(VocabularyError::SentenceNotFound(sentence_id));
        }
        Ok(())
    }

    fn save_annotations(&self, sentence_id: i64, tokens: &[Token]) -> Result<(), VocabularyError> {
        let json = serde_json::to_string(tokens)
            .map_err(|e| VocabularyError::Serialization(e.to_string()))?;

        let conn = self.db.lock()?;
        let updated = conn.execute(
            "UPDATE sentences SET annotations = ? WHERE id = ?",
            params![json, sentence_id],
        )?;
        if updated == 0 {
            return Err(VocabularyError::SentenceNotFound(sentence_id));
        }
        Ok(())
    }
}
