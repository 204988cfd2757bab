//! Content pipeline: everything the worker does for one claimed job.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::annotation::{Annotator, Dictionary};
use crate::audio::AudioService;
use crate::generator::{GeneratedSentence, GenerationRequest, SentenceGenerator};
use crate::jobs::Job;
use crate::metrics::{ANNOTATION_FAILURES, DUPLICATES_SKIPPED, SENTENCES_STORED};
use crate::notifier::{notify_safely, StatusNotifier, WordUpdate};
use crate::vocabulary::{
    normalize_text, InsertOutcome, NewSentence, Provenance, Sentence, VocabularyError,
    VocabularyStore, Word,
};

use super::types::{PipelineError, PipelineReport};

/// Audio attached to a new sentence, with its provenance.
struct SentenceAudio {
    path: String,
    service: String,
    model: Option<String>,
    downloaded: bool,
}

/// Drives audio backfill, sentence acquisition, annotation and verification
/// for one word.
pub struct ContentPipeline {
    vocabulary: Arc<dyn VocabularyStore>,
    generator: Arc<dyn SentenceGenerator>,
    audio: Arc<dyn AudioService>,
    annotator: Arc<dyn Annotator>,
    dictionary: Arc<dyn Dictionary>,
    notifier: Arc<dyn StatusNotifier>,
}

impl ContentPipeline {
    pub fn new(
        vocabulary: Arc<dyn VocabularyStore>,
        generator: Arc<dyn SentenceGenerator>,
        audio: Arc<dyn AudioService>,
        annotator: Arc<dyn Annotator>,
        dictionary: Arc<dyn Dictionary>,
        notifier: Arc<dyn StatusNotifier>,
    ) -> Self {
        Self {
            vocabulary,
            generator,
            audio,
            annotator,
            dictionary,
            notifier,
        }
    }

    /// Run the pipeline for `word` as requested by `job`.
    ///
    /// Safe to repeat: existing sentences are kept, only missing audio and
    /// the remaining sentence gap are produced.
    pub async fn run(&self, word: &Word, job: &Job) -> Result<PipelineReport, PipelineError> {
        let mut report = PipelineReport::default();
        let existing = self.vocabulary.list_sentences(word.id)?;

        report.audio_backfilled = self.backfill_audio(word, job, &existing).await?;

        let mut seen: HashSet<String> = existing
            .iter()
            .map(|s| normalize_text(&s.text))
            .collect();
        let needed = job
            .desired_sentence_count
            .saturating_sub(seen.len() as u32);

        if needed == 0 {
            debug!(word_id = word.id, "Word already has enough sentences");
        } else {
            report.requested = needed;
            let request = GenerationRequest {
                word: word.text.clone(),
                language: job.language.clone(),
                translation: word.translation.clone(),
                topic: job.topic.clone(),
                count: needed,
                existing: existing.iter().map(|s| s.text.clone()).collect(),
            };
            let candidates = self.generator.generate(&request).await?;
            debug!(
                word_id = word.id,
                needed,
                candidates = candidates.len(),
                "Received sentence candidates"
            );

            let mut stored = Vec::new();
            for candidate in candidates {
                if stored.len() as u32 >= needed {
                    break;
                }
                let normalized = normalize_text(&candidate.text);
                if normalized.is_empty() || !seen.insert(normalized) {
                    report.duplicates += 1;
                    DUPLICATES_SKIPPED.inc();
                    continue;
                }

                match self.store_candidate(word, job, candidate).await? {
                    Some(sentence) => stored.push(sentence),
                    None => {
                        report.duplicates += 1;
                        DUPLICATES_SKIPPED.inc();
                    }
                }
            }
            report.stored = stored.len() as u32;

            report.annotated = self.annotate(word, job, &stored)?;
        }

        let have = self
            .vocabulary
            .word_status(word.id)?
            .map(|s| s.sentence_count)
            .ok_or(VocabularyError::WordNotFound(word.id))?;
        report.sentence_count = have;

        if have < job.desired_sentence_count {
            return Err(PipelineError::Shortfall {
                word_id: word.id,
                have,
                want: job.desired_sentence_count,
            });
        }

        info!(
            word_id = word.id,
            stored = report.stored,
            backfilled = report.audio_backfilled,
            sentence_count = have,
            "Content pipeline finished"
        );
        Ok(report)
    }

    /// Attach synthesized audio to existing sentences that have none.
    async fn backfill_audio(
        &self,
        word: &Word,
        job: &Job,
        existing: &[Sentence],
    ) -> Result<u32, PipelineError> {
        let mut backfilled = 0;
        for sentence in existing.iter().filter(|s| s.audio_path.is_none()) {
            let path = self
                .audio
                .synthesize(&sentence.text, &job.language, &word.text)
                .await?;
            let voice = self.audio.voice(&job.language);
            self.vocabulary.set_sentence_audio(
                sentence.id,
                &path_string(&path),
                self.audio.name(),
                voice.as_deref(),
            )?;
            backfilled += 1;
        }
        if backfilled > 0 {
            info!(word_id = word.id, backfilled, "Backfilled missing sentence audio");
        }
        Ok(backfilled)
    }

    /// Obtain audio for a candidate and store it. Returns `None` if the store
    /// reports a duplicate.
    async fn store_candidate(
        &self,
        word: &Word,
        job: &Job,
        candidate: GeneratedSentence,
    ) -> Result<Option<Sentence>, PipelineError> {
        let audio = self.candidate_audio(word, job, &candidate).await?;

        let outcome = self.vocabulary.insert_sentence(NewSentence {
            word_id: word.id,
            text: candidate.text,
            translation: candidate.translation,
            audio_path: Some(audio.path),
            provenance: Provenance {
                text_service: self.generator.name().to_string(),
                text_model: self.generator.model().map(str::to_string),
                audio_service: Some(audio.service),
                audio_model: audio.model,
            },
        })?;

        match outcome {
            InsertOutcome::Inserted {
                sentence,
                sentence_count,
            } => {
                SENTENCES_STORED
                    .with_label_values(&[if audio.downloaded { "downloaded" } else { "synthesized" }])
                    .inc();
                let processing_status = self
                    .vocabulary
                    .word_status(word.id)?
                    .and_then(|s| s.processing_status);
                notify_safely(
                    self.notifier.as_ref(),
                    &WordUpdate {
                        word_id: word.id,
                        processing_status,
                        sentence_count,
                    },
                );
                Ok(Some(sentence))
            }
            InsertOutcome::Duplicate => Ok(None),
        }
    }

    /// Download the candidate's recording if it has one, otherwise synthesize.
    /// A failed download falls back to synthesis.
    async fn candidate_audio(
        &self,
        word: &Word,
        job: &Job,
        candidate: &GeneratedSentence,
    ) -> Result<SentenceAudio, PipelineError> {
        if let Some(ref url) = candidate.source_audio_url {
            match self
                .audio
                .download_from_url(url, &candidate.text, &job.language, &word.text)
                .await
            {
                Ok(path) => {
                    return Ok(SentenceAudio {
                        path: path_string(&path),
                        service: self.generator.name().to_string(),
                        model: None,
                        downloaded: true,
                    })
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Audio download failed, synthesizing instead");
                }
            }
        }

        let path = self
            .audio
            .synthesize(&candidate.text, &job.language, &word.text)
            .await?;
        Ok(SentenceAudio {
            path: path_string(&path),
            service: self.audio.name().to_string(),
            model: self.audio.voice(&job.language),
            downloaded: false,
        })
    }

    /// Cache annotations for new sentences. Failures are logged and skipped
    /// unless the vocabulary store itself is unreachable.
    fn annotate(&self, word: &Word, job: &Job, sentences: &[Sentence]) -> Result<u32, PipelineError> {
        if sentences.is_empty() {
            return Ok(0);
        }

        let all_words = match self.vocabulary.word_texts(&job.language) {
            Ok(words) => words,
            Err(e) if e.is_infrastructure() => return Err(e.into()),
            Err(e) => {
                warn!(word_id = word.id, error = %e, "Cannot load word list, skipping annotation");
                ANNOTATION_FAILURES.inc_by(sentences.len() as u64);
                return Ok(0);
            }
        };

        let mut annotated = 0;
        for sentence in sentences {
            let tokens = match self.annotator.annotate(
                &sentence.text,
                &word.text,
                &all_words,
                self.dictionary.as_ref(),
                &job.language,
            ) {
                Ok(tokens) => tokens,
                Err(e) => {
                    warn!(sentence_id = sentence.id, error = %e, "Annotation failed");
                    ANNOTATION_FAILURES.inc();
                    continue;
                }
            };

            match self.vocabulary.save_annotations(sentence.id, &tokens) {
                Ok(()) => annotated += 1,
                Err(e) if e.is_infrastructure() => return Err(e.into()),
                Err(e) => {
                    warn!(sentence_id = sentence.id, error = %e, "Could not cache annotations");
                    ANNOTATION_FAILURES.inc();
                }
            }
        }

        Ok(annotated)
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
