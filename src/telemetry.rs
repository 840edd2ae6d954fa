//! Telemetry utilities for command timing and log correlation.

use std::time::Instant;

/// Longest message excerpt written to logs, in characters.
pub const LOG_EXCERPT_CHARS: usize = 80;

/// Guard for timing a command handler and recording metrics.
///
/// Records latency when dropped, so a panicking handler is still timed.
pub struct CommandTimer {
    path: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing the command at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_command(&self.path, duration);
    }
}

/// Shorten `text` for a log line, cutting on a char boundary.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_owned(),
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};
    use uuid::Uuid;

    /// Span for one command handler task.
    pub fn invocation(id: &Uuid, plugin: &str, path: &str, author: &str) -> Span {
        info_span!("invocation", id = %id, plugin = %plugin, path = %path, author = %author)
    }

    /// Span for a plugin's message observer.
    pub fn observer(plugin: &str) -> Span {
        info_span!("observer", plugin = %plugin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("héllo wörld", 2), "hé...");
        assert_eq!(truncate("", 0), "");
    }
}
