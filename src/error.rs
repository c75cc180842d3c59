//! Error types for the task-routing pipeline
//!
//! Internal failure detail (stack data, downstream error text) must never
//! reach the caller: every variant maps to a generic user-facing message via
//! [`PipelineError::user_message`].

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Main error type for pipeline operations
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input rejected by pattern guard")]
    GuardRejection,

    #[error("Unknown capability: {name}")]
    UnknownCapability { name: String },

    #[error("Agent execution failed: {message}")]
    AgentFailure { message: String },

    #[error("Circuit open for capability '{capability}'")]
    CircuitOpen { capability: String },

    #[error("Execution failed after {attempts} attempts: {message}")]
    RetryExhausted { attempts: u32, message: String },

    #[error("Request deadline exceeded")]
    DeadlineExceeded,

    #[error("Internal error: {message}")]
    InternalError { message: String },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),
}

impl PipelineError {
    /// Create an agent execution error
    pub fn agent_failure<S: Into<String>>(message: S) -> Self {
        Self::AgentFailure {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Whether this error is worth retrying at the execution step
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PipelineError::AgentFailure { .. } | PipelineError::CircuitOpen { .. }
        )
    }

    /// Generic caller-facing message for this error
    ///
    /// Blocked input gets the fixed redaction string; everything else
    /// collapses to one processing-failure message so no internal detail
    /// leaks through the response body.
    pub fn user_message(&self) -> &'static str {
        match self {
            PipelineError::GuardRejection => crate::guard::REDACTION_MESSAGE,
            _ => "Agent processing failed. Please try again later.",
        }
    }
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

static SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+").expect("valid secret pattern")
});

static PATH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/[a-zA-Z0-9._/-]{8,}").expect("valid path pattern"));

/// Scrub secrets and filesystem paths out of a message before it is logged
pub fn sanitize_error_message(message: &str) -> String {
    let sanitized = SECRET_PATTERN.replace_all(message, "${1}=***");
    PATH_PATTERN.replace_all(&sanitized, "[path]").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_never_leaks_detail() {
        let err = PipelineError::agent_failure("connection refused to 10.0.0.1:5432");
        assert_eq!(
            err.user_message(),
            "Agent processing failed. Please try again later."
        );

        let err = PipelineError::RetryExhausted {
            attempts: 3,
            message: "boom".to_string(),
        };
        assert!(!err.user_message().contains("boom"));
    }

    #[test]
    fn test_guard_rejection_maps_to_redaction() {
        assert_eq!(
            PipelineError::GuardRejection.user_message(),
            "[REDACTED: SECURITY VIOLATION]"
        );
    }

    #[test]
    fn test_sanitize_scrubs_secrets() {
        let sanitized = sanitize_error_message("auth failed: token=abc123 for user");
        assert!(!sanitized.contains("abc123"));
        assert!(sanitized.contains("token=***"));
    }

    #[test]
    fn test_sanitize_scrubs_paths() {
        let sanitized = sanitize_error_message("cannot read /var/lib/agentpipe/data.csv");
        assert!(!sanitized.contains("/var/lib"));
        assert!(sanitized.contains("[path]"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(PipelineError::agent_failure("x").is_transient());
        assert!(PipelineError::CircuitOpen {
            capability: "eda".to_string()
        }
        .is_transient());
        assert!(!PipelineError::GuardRejection.is_transient());
        assert!(!PipelineError::DeadlineExceeded.is_transient());
    }
}
