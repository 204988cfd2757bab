//! Shared SQLite connection and schema.
//!
//! The job store and the vocabulary store live in the same database file so
//! that enqueueing a job and flipping the word's processing status can be a
//! single transaction. Both stores hold a clone of [`Database`].

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode};
use thiserror::Error;

/// Low-level storage failure, classified by whether the database itself is
/// reachable.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The database cannot be used at all (cannot open, I/O failure, locked,
    /// corrupt, poisoned connection).
    #[error("database unavailable: {0}")]
    Unavailable(String),

    /// A statement failed against a working database.
    #[error("database error: {0}")]
    Query(String),
}

impl StorageError {
    /// Whether this failure means the store is unreachable.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StorageError::Unavailable(_))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _) => match code.code {
                ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::NotADatabase
                | ErrorCode::ReadOnly
                | ErrorCode::DiskFull => StorageError::Unavailable(err.to_string()),
                _ => StorageError::Query(err.to_string()),
            },
            _ => StorageError::Query(err.to_string()),
        }
    }
}

/// Handle to the application database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and make sure all tables exist.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Lock the connection for a unit of work.
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Unavailable("connection mutex poisoned".to_string()))
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StorageError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS words (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                language TEXT NOT NULL,
                translation TEXT,
                processing_status TEXT,
                sentence_count INTEGER NOT NULL DEFAULT 0,
                created_at_ms INTEGER NOT NULL,
                updated_at_ms INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_words_language ON words(language);

            CREATE TABLE IF NOT EXISTS sentences (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                word_id INTEGER NOT NULL REFERENCES words(id) ON DELETE CASCADE,
                text TEXT NOT NULL,
                normalized_text TEXT NOT NULL,
                translation TEXT,
                audio_path TEXT,
                text_service TEXT NOT NULL,
                text_model TEXT,
                audio_service TEXT,
                audio_model TEXT,
                annotations TEXT,
                created_at_ms INTEGER NOT NULL,
                UNIQUE(word_id, normalized_text)
            );

            CREATE INDEX IF NOT EXISTS idx_sentences_word ON sentences(word_id);

            CREATE TABLE IF NOT EXISTS generation_jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                word_id INTEGER NOT NULL UNIQUE,
                language TEXT NOT NULL,
                topic TEXT,
                desired_sentence_count INTEGER NOT NULL,
                status TEXT NOT NULL,
                attempts INTEGER NOT NULL DEFAULT 0,
                version INTEGER NOT NULL DEFAULT 1,
                last_error TEXT,
                available_at_ms INTEGER NOT NULL,
                created_at_ms INTEGER NOT NULL,
                updated_at_ms INTEGER NOT NULL,
                started_at_ms INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_claim_order
                ON generation_jobs(status, updated_at_ms, created_at_ms);
            "#,
        )?;
        Ok(())
    }
}

/// Current time as epoch milliseconds.
pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// A duration as milliseconds, clamped to `i64::MAX`.
pub(crate) fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Convert stored epoch milliseconds back to a timestamp.
pub(crate) fn from_ms(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}
