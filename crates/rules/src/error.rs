//! Errors raised while turning a stored template into a rule group.

use crate::duration::DurationError;
use crate::expression::ExpressionError;

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Stored template is not a well-formed rule document.
    #[error("template decode error: {0}")]
    TemplateDecode(#[source] serde_yaml::Error),

    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// `for` field that is neither empty nor a duration.
    #[error("invalid for duration {value:?}: {source}")]
    InvalidFor {
        value: String,
        #[source]
        source: DurationError,
    },

    #[error("rule encode error: {0}")]
    Encode(#[source] serde_yaml::Error),
}

/// Result alias for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;
