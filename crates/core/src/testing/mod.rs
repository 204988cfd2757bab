//! Testing utilities and mock implementations.
//!
//! Mocks for every external collaborator of the worker, so the queue and the
//! pipeline can be exercised end to end without an LLM, a TTS binary or the
//! network.
//!
//! # Example
//!
//! ```rust,ignore
//! use phrasebook_core::testing::{MockAudioService, MockSentenceGenerator, RecordingNotifier};
//!
//! let generator = MockSentenceGenerator::new();
//! let audio = MockAudioService::new();
//! let notifier = RecordingNotifier::new();
//!
//! // Configure mock behavior
//! generator.fail_next(1).await;
//! audio.set_fail_downloads(true).await;
//!
//! // Wire into a ContentPipeline...
//! ```

mod mock_annotator;
mod mock_audio;
mod mock_generator;

pub use mock_annotator::{MockAnnotator, RecordingNotifier};
pub use mock_audio::{MockAudioService, RecordedAudio};
pub use mock_generator::MockSentenceGenerator;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::generator::GeneratedSentence;
    use crate::vocabulary::{NewSentence, NewWord, Provenance};

    /// A Spanish word with an English translation.
    pub fn spanish_word(text: &str) -> NewWord {
        NewWord::new(text, "es").with_translation(format!("{} (en)", text))
    }

    /// A generated candidate without a source recording.
    pub fn generated(text: &str) -> GeneratedSentence {
        GeneratedSentence {
            text: text.to_string(),
            translation: None,
            source_audio_url: None,
        }
    }

    /// A generated candidate that carries a downloadable recording.
    pub fn generated_with_audio(text: &str, url: &str) -> GeneratedSentence {
        GeneratedSentence {
            source_audio_url: Some(url.to_string()),
            ..generated(text)
        }
    }

    /// A stored sentence as a user would have added it by hand.
    pub fn manual_sentence(word_id: i64, text: &str, audio_path: Option<&str>) -> NewSentence {
        NewSentence {
            word_id,
            text: text.to_string(),
            translation: None,
            audio_path: audio_path.map(str::to_string),
            provenance: Provenance {
                text_service: "manual".to_string(),
                ..Provenance::default()
            },
        }
    }
}
