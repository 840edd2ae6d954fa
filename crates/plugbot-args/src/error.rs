//! Argument resolution errors.

use thiserror::Error;

/// Convenience alias for results produced by this crate.
pub type Result<T, E = ArgError> = std::result::Result<T, E>;

/// Why a parameter list could not be turned into [`Args`](crate::Args).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ArgError {
    /// A required parameter had no token left to consume.
    ///
    /// This is not a user-facing failure by itself: callers use it to try a
    /// continuation command or to show usage.
    #[error("missing argument: {param}")]
    Incomplete {
        /// Name of the first unsatisfied parameter.
        param: String,
    },

    /// A token was present but could not be converted.
    #[error("invalid value for {param}: {reason}")]
    Invalid {
        /// Name of the parameter that rejected its token.
        param: String,
        /// Human-readable conversion failure.
        reason: String,
    },
}

impl ArgError {
    /// Name of the parameter this error refers to.
    pub fn param(&self) -> &str {
        match self {
            Self::Incomplete { param } | Self::Invalid { param, .. } => param,
        }
    }

    /// Returns `true` for [`ArgError::Incomplete`].
    #[inline]
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::Incomplete { .. })
    }

    /// Static label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Incomplete { .. } => "incomplete",
            Self::Invalid { .. } => "invalid",
        }
    }
}
