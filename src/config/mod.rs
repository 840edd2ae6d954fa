//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: config struct definitions and loading (Config, BotConfig, ...)
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup checks collecting every error at once

mod defaults;
mod types;
pub mod validation;

pub use types::{
    AutosaveConfig, BotConfig, Config, ConfigError, LogConfig, LogFormat, MetricsConfig,
    PluginsConfig,
};
pub use validation::{ValidationError, validate};
