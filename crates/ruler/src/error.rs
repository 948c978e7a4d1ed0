use alertsync_core::CoreError;
use alertsync_rules::duration::DurationError;
use alertsync_rules::{ExpressionError, RuleError, RuleGroup};

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "no response".to_string(),
    }
}

/// Errors from building, pushing, verifying or removing a definition's group.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("definition store error: {0}")]
    Store(#[from] CoreError),

    #[error("template decode error: {0}")]
    TemplateDecode(#[source] serde_yaml::Error),

    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error("invalid for duration {value:?}: {source}")]
    InvalidFor {
        value: String,
        #[source]
        source: DurationError,
    },

    #[error("rule group encode error: {0}")]
    Encode(#[source] serde_yaml::Error),

    #[error("push of group {group} failed ({}): {message}", status_label(.status))]
    PushFailed {
        group: String,
        status: Option<u16>,
        message: String,
    },

    #[error("fetch of group {group} failed ({}): {message}", status_label(.status))]
    FetchFailed {
        group: String,
        status: Option<u16>,
        message: String,
    },

    #[error("delete of group {group} failed ({}): {message}", status_label(.status))]
    DeleteFailed {
        group: String,
        status: Option<u16>,
        message: String,
    },

    /// Fetched body is not a well-formed rule group.
    #[error("fetched group decode error: {0}")]
    DecodeFailed(String),

    #[error("group {group} holds {count} rules, expected exactly one")]
    UnexpectedRuleCount { group: String, count: usize },

    #[error("group {group} does not match what was pushed: {}", .differences.join("; "))]
    ReconciliationMismatch {
        group: String,
        expected: Box<RuleGroup>,
        actual: Box<RuleGroup>,
        differences: Vec<String>,
    },

    #[error("sync of group {group} did not finish before the deadline")]
    DeadlineExceeded { group: String },
}

impl From<RuleError> for SyncError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::TemplateDecode(e) => SyncError::TemplateDecode(e),
            RuleError::Expression(e) => SyncError::Expression(e),
            RuleError::InvalidFor { value, source } => SyncError::InvalidFor { value, source },
            RuleError::Encode(e) => SyncError::Encode(e),
        }
    }
}

impl SyncError {
    /// Whether a later attempt could succeed without changing the definition.
    ///
    /// Nothing in this crate retries; callers decide.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::PushFailed { status, .. }
            | SyncError::FetchFailed { status, .. }
            | SyncError::DeleteFailed { status, .. } => match status {
                None => true,
                Some(code) => *code == 429 || *code >= 500,
            },
            SyncError::DeadlineExceeded { .. } | SyncError::ReconciliationMismatch { .. } => true,
            _ => false,
        }
    }
}
