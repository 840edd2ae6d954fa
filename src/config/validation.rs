//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::collections::HashSet;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("bot.prefix must not be empty")]
    EmptyPrefix,
    #[error("bot.prefix must not contain whitespace, got {0:?}")]
    PrefixWhitespace(String),
    #[error("bot.owner must not be empty when set")]
    EmptyOwner,
    #[error("autosave.interval_secs must be greater than 0")]
    ZeroAutosaveInterval,
    #[error("plugins.autoload contains an empty name")]
    EmptyPluginName,
    #[error("plugins.autoload lists '{0}' more than once")]
    DuplicateAutoload(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let prefix = &config.bot.prefix;
    if prefix.is_empty() {
        errors.push(ValidationError::EmptyPrefix);
    } else if prefix.chars().any(char::is_whitespace) {
        errors.push(ValidationError::PrefixWhitespace(prefix.clone()));
    }
    if config.bot.owner.as_deref().is_some_and(|o| o.trim().is_empty()) {
        errors.push(ValidationError::EmptyOwner);
    }

    if config.autosave.interval_secs == 0 {
        errors.push(ValidationError::ZeroAutosaveInterval);
    }

    let mut seen = HashSet::new();
    for name in &config.plugins.autoload {
        if name.trim().is_empty() {
            errors.push(ValidationError::EmptyPluginName);
        } else if !seen.insert(name.as_str()) {
            errors.push(ValidationError::DuplicateAutoload(name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
