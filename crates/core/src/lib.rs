pub mod annotation;
pub mod audio;
pub mod config;
pub mod db;
pub mod generator;
pub mod jobs;
pub mod metrics;
pub mod notifier;
pub mod testing;
pub mod vocabulary;
pub mod worker;

pub use annotation::{Annotator, Dictionary, DictionaryAnnotator, MemoryDictionary, Token};
pub use audio::{create_audio_service, AudioConfig, AudioError, AudioService};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use db::{Database, StorageError};
pub use generator::{create_sentence_generator, GeneratorConfig, GeneratorError, SentenceGenerator};
pub use jobs::{
    EnqueueOptions, GenerationQueue, Job, JobError, JobStatus, JobStore, QueueError,
    QueueSummary, SqliteJobStore,
};
pub use notifier::{
    notify_safely, notify_worker_safely, CallbackNotifier, NoopNotifier, StatusNotifier, WordUpdate,
};
pub use vocabulary::{
    ProcessingStatus, SqliteVocabularyStore, VocabularyError, VocabularyStore, Word, WordStatus,
};
pub use worker::{ContentPipeline, GenerationWorker, WorkerConfig, WorkerStatus};
