use super::{types::Config, ConfigError};
use crate::generator::GeneratorProvider;

/// Validate configuration
/// Currently validates:
/// - Generator section exists (enforced by serde)
/// - Server port is not 0
/// - Worker limits are usable
/// - LLM providers have a model, Anthropic has an API key
/// - Timeouts are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    // Worker validation
    let worker = &config.worker;
    if worker.max_attempts == 0 {
        return Err(invalid("worker.max_attempts must be at least 1"));
    }
    if worker.poll_interval_ms == 0 {
        return Err(invalid("worker.poll_interval_ms cannot be 0"));
    }
    if worker.default_sentence_count == 0 {
        return Err(invalid("worker.default_sentence_count must be at least 1"));
    }

    // Generator validation
    let generator = &config.generator;
    if generator.provider.is_llm() && generator.model.as_deref().map_or(true, str::is_empty) {
        return Err(ConfigError::ValidationError(format!(
            "generator.model is required for provider '{}'",
            generator.provider.as_str()
        )));
    }
    if generator.provider == GeneratorProvider::Anthropic
        && generator.api_key.as_deref().map_or(true, str::is_empty)
    {
        return Err(invalid("generator.api_key is required for provider 'anthropic'"));
    }
    if generator.timeout_secs == 0 {
        return Err(invalid("generator.timeout_secs cannot be 0"));
    }

    // Audio validation
    if config.audio.timeout_secs == 0 {
        return Err(invalid("audio.timeout_secs cannot be 0"));
    }
    if config.audio.extension.is_empty() {
        return Err(invalid("audio.extension cannot be empty"));
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
