//! Unified error handling for plugbot.
//!
//! One error enum per layer: command registration, the plugin registry,
//! the transport, and command handlers. Argument errors live in
//! `plugbot_args` and are re-used here.

use thiserror::Error;

// ============================================================================
// Registration Errors (plugin load time)
// ============================================================================

/// Invariant violations detected while a plugin registers its commands.
///
/// Any of these aborts the load of the whole plugin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("command name must be a single non-empty word, got {0:?}")]
    InvalidName(String),

    #[error("duplicate command name '{name}' under {scope}")]
    DuplicateName { name: String, scope: String },

    #[error("unknown parent command id {0}")]
    UnknownParent(usize),

    #[error("unknown fallback command id {0}")]
    UnknownFallback(usize),

    #[error("command '{command}': rest-of-message parameter '{param}' must be last")]
    RestNotLast { command: String, param: String },

    #[error("command '{command}': required parameter '{param}' follows an optional one")]
    RequiredAfterOptional { command: String, param: String },
}

// ============================================================================
// Registry Errors (load / unload / reload)
// ============================================================================

/// Plugin lifecycle failures. Registry state is unchanged when one of these
/// is returned from `load`.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no plugin named '{0}'")]
    NotFound(String),

    #[error("plugin '{0}' is already loaded")]
    AlreadyLoaded(String),

    #[error("plugin '{0}' is not loaded")]
    NotLoaded(String),

    #[error("plugin '{name}' failed to initialize: {reason}")]
    Init { name: String, reason: String },

    #[error("plugin '{name}' failed to register commands: {source}")]
    Registration {
        name: String,
        #[source]
        source: RegistrationError,
    },
}

impl RegistryError {
    /// Static error code for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyLoaded(_) => "already_loaded",
            Self::NotLoaded(_) => "not_loaded",
            Self::Init { .. } => "init_failed",
            Self::Registration { .. } => "registration_failed",
        }
    }
}

// ============================================================================
// Transport Errors
// ============================================================================

/// Failures reported by the chat transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,

    #[error("send failed: {0}")]
    Send(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Handler Errors (command bodies)
// ============================================================================

/// Errors a command handler may return. They are logged with full context
/// and never reach the dispatcher loop.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("reply failed: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("timed out waiting for a reply")]
    ReplyTimeout,

    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    /// Static error code for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Registry(_) => "registry",
            Self::ReplyTimeout => "reply_timeout",
            Self::Cancelled => "cancelled",
            Self::Other(_) => "other",
        }
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(RegistryError::NotFound("x".into()).error_code(), "not_found");
        assert_eq!(HandlerError::ReplyTimeout.error_code(), "reply_timeout");
        assert_eq!(
            HandlerError::from(anyhow::anyhow!("boom")).error_code(),
            "other"
        );
    }

    #[test]
    fn test_registration_error_keeps_source() {
        let err = RegistryError::Registration {
            name: "games".into(),
            source: RegistrationError::DuplicateName {
                name: "play".into(),
                scope: "top level".into(),
            },
        };
        let text = err.to_string();
        assert!(text.contains("games"));
        assert!(text.contains("duplicate command name 'play'"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
