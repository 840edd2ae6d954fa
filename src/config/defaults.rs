//! Default value functions for configuration.

// =============================================================================
// Bot Defaults
// =============================================================================

pub fn default_prefix() -> String {
    "!".to_string()
}

// =============================================================================
// Autosave Defaults
// =============================================================================

pub fn default_autosave_interval() -> u64 {
    300
}
