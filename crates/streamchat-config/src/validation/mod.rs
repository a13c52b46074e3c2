//! Full configuration validation.
//!
//! Each section has its own check; this orchestrator runs them all and
//! collects every problem into a single `ConfigError`.

mod helpers;
mod sections;


use crate::schema::StreamchatConfig;
use streamchat_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &StreamchatConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    sections::validate_provider(&mut errors, config);
    sections::validate_persona(&mut errors, config);
    sections::validate_server(&mut errors, config);
    sections::validate_history(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
