//! SQLite-backed job store implementation.

use std::time::Duration;

use rusqlite::{params, OptionalExtension};

use crate::db::{duration_ms, from_ms, now_ms, Database};

use super::{EnqueueRequest, Job, JobClaim, JobError, JobStatus, JobStore, QueueSummary, QueuedWord};

const JOB_COLUMNS: &str = "id, word_id, language, topic, desired_sentence_count, status, attempts, version, last_error, available_at_ms, created_at_ms, updated_at_ms, started_at_ms";

/// Job store over the shared application database.
#[derive(Clone)]
pub struct SqliteJobStore {
    db: Database,
    backoff_gate: bool,
}

impl SqliteJobStore {
    /// Create a job store with the backoff gate enabled.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            backoff_gate: true,
        }
    }

    /// When disabled, rescheduled jobs are only deferred by their position in
    /// the claim order, not by their `available_at` time.
    pub fn with_backoff_gate(mut self, enabled: bool) -> Self {
        self.backoff_gate = enabled;
        self
    }

    fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<Job> {
        let status_str: String = row.get(5)?;
        let status = status_str.parse::<JobStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
            )
        })?;
        let started_at_ms: Option<i64> = row.get(12)?;

        Ok(Job {
            id: row.get(0)?,
            word_id: row.get(1)?,
            language: row.get(2)?,
            topic: row.get(3)?,
            desired_sentence_count: row.get(4)?,
            status,
            attempts: row.get(6)?,
            version: row.get(7)?,
            last_error: row.get(8)?,
            available_at: from_ms(row.get(9)?),
            created_at: from_ms(row.get(10)?),
            updated_at: from_ms(row.get(11)?),
            started_at: started_at_ms.map(from_ms),
        })
    }

    fn load_by_word(conn: &rusqlite::Connection, word_id: i64) -> Result<Option<Job>, JobError> {
        let job = conn
            .query_row(
                &format!("SELECT {} FROM generation_jobs WHERE word_id = ?", JOB_COLUMNS),
                params![word_id],
                Self::row_to_job,
            )
            .optional()?;
        Ok(job)
    }

    fn list_words(
        conn: &rusqlite::Connection,
        status: JobStatus,
        language: Option<&str>,
    ) -> Result<Vec<QueuedWord>, JobError> {
        let mut stmt = conn.prepare(
            "SELECT j.word_id, w.text, j.topic
             FROM generation_jobs j
             JOIN words w ON w.id = j.word_id
             WHERE j.status = ?1
               AND (w.processing_status IS NULL OR w.processing_status != 'failed')
               AND (?2 IS NULL OR j.language = ?2)
             ORDER BY j.updated_at_ms ASC, j.created_at_ms ASC, j.id ASC",
        )?;
        let words = stmt
            .query_map(params![status.as_str(), language], |row| {
                Ok(QueuedWord {
                    word_id: row.get(0)?,
                    text: row.get(1)?,
                    topic: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(words)
    }
}

impl JobStore for SqliteJobStore {
    fn enqueue(&self, request: EnqueueRequest) -> Result<Job, JobError> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        let now = now_ms();

        let word_updated = tx.execute(
            "UPDATE words SET processing_status = 'queued', updated_at_ms = ? WHERE id = ?",
            params![now, request.word_id],
        )?;
        if word_updated == 0 {
            return Err(JobError::WordNotFound(request.word_id));
        }

        tx.execute(
            "INSERT INTO generation_jobs (word_id, language, topic, desired_sentence_count, status, attempts, version, last_error, available_at_ms, created_at_ms, updated_at_ms, started_at_ms)
             VALUES (?1, ?2, ?3, ?4, 'queued', 0, 1, NULL, ?5, ?5, ?5, NULL)
             ON CONFLICT(word_id) DO UPDATE SET
                 language = excluded.language,
                 topic = excluded.topic,
                 desired_sentence_count = excluded.desired_sentence_count,
                 status = 'queued',
                 attempts = 0,
                 version = generation_jobs.version + 1,
                 last_error = NULL,
                 available_at_ms = excluded.available_at_ms,
                 updated_at_ms = excluded.updated_at_ms,
                 started_at_ms = NULL",
            params![
                request.word_id,
                request.language,
                request.topic,
                request.desired_sentence_count,
                now,
            ],
        )?;

        let job = Self::load_by_word(&tx, request.word_id)?
            .ok_or(JobError::WordNotFound(request.word_id))?;
        tx.commit()?;

        Ok(job)
    }

    fn get_next_job(&self) -> Result<Option<Job>, JobError> {
        let conn = self.db.lock()?;
        let job = conn
            .query_row(
                &format!(
                    "SELECT {} FROM generation_jobs
                     WHERE status = 'queued' AND (?1 = 0 OR available_at_ms <= ?2)
                     ORDER BY updated_at_ms ASC, created_at_ms ASC, id ASC
                     LIMIT 1",
                    JOB_COLUMNS
                ),
                params![self.backoff_gate, now_ms()],
                Self::row_to_job,
            )
            .optional()?;
        Ok(job)
    }

    fn mark_processing(&self, job: &Job) -> Result<Option<JobClaim>, JobError> {
        let conn = self.db.lock()?;
        let now = now_ms();

        let attempts: Option<u32> = conn
            .query_row(
                "UPDATE generation_jobs
                 SET status = 'processing', attempts = attempts + 1, started_at_ms = ?1, updated_at_ms = ?1
                 WHERE id = ?2 AND version = ?3 AND status = 'queued'
                 RETURNING attempts",
                params![now, job.id, job.version],
                |row| row.get(0),
            )
            .optional()?;

        Ok(attempts.map(|attempts| JobClaim {
            job_id: job.id,
            word_id: job.word_id,
            version: job.version,
            attempts,
        }))
    }

    fn reschedule(
        &self,
        claim: &JobClaim,
        delay: Duration,
        last_error: Option<&str>,
    ) -> Result<bool, JobError> {
        let conn = self.db.lock()?;
        let available_at = now_ms().saturating_add(duration_ms(delay));

        let updated = conn.execute(
            "UPDATE generation_jobs
             SET status = 'queued', updated_at_ms = ?1, available_at_ms = ?1, started_at_ms = NULL,
                 last_error = COALESCE(?2, last_error)
             WHERE id = ?3 AND version = ?4 AND status = 'processing'",
            params![available_at, last_error, claim.job_id, claim.version],
        )?;
        Ok(updated == 1)
    }

    fn complete(&self, claim: &JobClaim) -> Result<bool, JobError> {
        let conn = self.db.lock()?;
        let updated = conn.execute(
            "UPDATE generation_jobs
             SET status = 'completed', updated_at_ms = ?1, started_at_ms = NULL
             WHERE id = ?2 AND version = ?3 AND status = 'processing'",
            params![now_ms(), claim.job_id, claim.version],
        )?;
        Ok(updated == 1)
    }

    fn fail(&self, claim: &JobClaim, message: &str) -> Result<bool, JobError> {
        let conn = self.db.lock()?;
        let updated = conn.execute(
            "UPDATE generation_jobs
             SET status = 'failed', last_error = ?1, updated_at_ms = ?2, started_at_ms = NULL
             WHERE id = ?3 AND version = ?4 AND status = 'processing'",
            params![message, now_ms(), claim.job_id, claim.version],
        )?;
        Ok(updated == 1)
    }

    fn get(&self, word_id: i64) -> Result<Option<Job>, JobError> {
        let conn = self.db.lock()?;
        Self::load_by_word(&conn, word_id)
    }

    fn queue_summary(&self, language: Option<&str>) -> Result<QueueSummary, JobError> {
        let conn = self.db.lock()?;
        let mut summary = QueueSummary::default();

        {
            let mut stmt = conn.prepare(
                "SELECT status, COUNT(*) FROM generation_jobs
                 WHERE (?1 IS NULL OR language = ?1)
                 GROUP BY status",
            )?;
            let rows = stmt.query_map(params![language], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
            })?;
            for row in rows {
                let (status, count) = row?;
                match status.parse::<JobStatus>() {
                    Ok(JobStatus::Queued) => summary.queued = count,
                    Ok(JobStatus::Processing) => summary.processing = count,
                    Ok(JobStatus::Completed) => summary.completed = count,
                    Ok(JobStatus::Failed) => summary.failed = count,
                    Err(e) => tracing::warn!(error = %e, "Ignoring unknown job status in summary"),
                }
            }
        }

        summary.queued_words = Self::list_words(&conn, JobStatus::Queued, language)?;
        summary.processing_words = Self::list_words(&conn, JobStatus::Processing, language)?;

        Ok(summary)
    }

    fn requeue_stale(&self, older_than: Duration) -> Result<Vec<i64>, JobError> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        let now = now_ms();
        let cutoff = now.saturating_sub(duration_ms(older_than));

        let word_ids = {
            let mut stmt = tx.prepare(
                "UPDATE generation_jobs
                 SET status = 'queued', version = version + 1, started_at_ms = NULL,
                     available_at_ms = ?1, updated_at_ms = ?1
                 WHERE status = 'processing' AND started_at_ms <= ?2
                 RETURNING word_id",
            )?;
            let ids = stmt
                .query_map(params![now, cutoff], |row| row.get::<_, i64>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            ids
        };

        for word_id in &word_ids {
            tx.execute(
                "UPDATE words SET processing_status = 'queued', updated_at_ms = ? WHERE id = ?",
                params![now, word_id],
            )?;
        }
        tx.commit()?;

        Ok(word_ids)
    }
}
