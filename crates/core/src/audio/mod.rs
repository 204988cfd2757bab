//! Sentence audio: speech synthesis and recording downloads.

mod command;
mod config;
mod types;

use std::sync::Arc;

pub use command::CommandAudioService;
pub use config::AudioConfig;
pub use types::{AudioError, AudioService};

/// Build the configured audio service.
pub fn create_audio_service(config: &AudioConfig) -> Arc<dyn AudioService> {
    Arc::new(CommandAudioService::new(config.clone()))
}
