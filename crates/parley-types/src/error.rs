//! Typed errors surfaced by the orchestration engines.
//!
//! Every variant carries a stable machine-readable code so any presentation
//! layer can render `{error, code}` without matching on variants itself.
//! Validation and session-state violations are client errors; backend and
//! store failures are server errors.

use thiserror::Error;

use crate::llm::LlmError;

/// Errors from session store operations.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors from the multi-round dialog orchestrator.
#[derive(Debug, Error)]
pub enum DialogError {
    #[error("message must not be empty")]
    EmptyMessage,

    #[error("maxRounds must be at least 1, got {0}")]
    InvalidMaxRounds(u32),

    #[error("at most one compression threshold may be set")]
    BothCompressionThresholdsSet,

    #[error("dialog already completed after {0} rounds")]
    DialogCompleted(u32),

    #[error("round limit exceeded: {current} of {max}")]
    MaxRoundsExceeded { current: u32, max: u32 },

    #[error("unknown vendor: '{0}'")]
    UnknownVendor(String),

    #[error("backend failure: {0}")]
    Backend(#[from] LlmError),

    #[error("backend returned non-JSON content when JSON output was required: {0}")]
    OutputFormatViolation(String),

    #[error("session store failure: {0}")]
    Store(#[from] SessionStoreError),
}

impl DialogError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            DialogError::EmptyMessage => "EMPTY_MESSAGE",
            DialogError::InvalidMaxRounds(_) => "INVALID_MAX_ROUNDS",
            DialogError::BothCompressionThresholdsSet => "BOTH_COMPRESSION_THRESHOLDS_SET",
            DialogError::DialogCompleted(_) => "DIALOG_COMPLETED",
            DialogError::MaxRoundsExceeded { .. } => "MAX_ROUNDS_EXCEEDED",
            DialogError::UnknownVendor(_) => "UNKNOWN_VENDOR",
            DialogError::Backend(_) => "BACKEND_FAILURE",
            DialogError::OutputFormatViolation(_) => "OUTPUT_FORMAT_VIOLATION",
            DialogError::Store(_) => "SESSION_STORE_FAILURE",
        }
    }

    /// Whether the caller (not the backend) caused this error.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DialogError::EmptyMessage
                | DialogError::InvalidMaxRounds(_)
                | DialogError::BothCompressionThresholdsSet
                | DialogError::DialogCompleted(_)
                | DialogError::MaxRoundsExceeded { .. }
                | DialogError::UnknownVendor(_)
        )
    }
}

/// Errors from the tool-calling agent loop.
///
/// Individual tool failures are not errors at this level; they are fed back
/// to the model as recoverable error turns. Only discovery failing for every
/// configured server, or a backend failure, aborts the request.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("no tools available from any configured tool server")]
    NoToolsAvailable,

    #[error("message must not be empty")]
    EmptyMessage,

    #[error("maxToolIterations must be at least 1, got {0}")]
    InvalidMaxIterations(u32),

    #[error("unknown vendor: '{0}'")]
    UnknownVendor(String),

    #[error("backend failure: {0}")]
    Backend(#[from] LlmError),
}

impl AgentError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            AgentError::NoToolsAvailable => "NO_TOOLS_AVAILABLE",
            AgentError::EmptyMessage => "EMPTY_MESSAGE",
            AgentError::InvalidMaxIterations(_) => "INVALID_MAX_ITERATIONS",
            AgentError::UnknownVendor(_) => "UNKNOWN_VENDOR",
            AgentError::Backend(_) => "BACKEND_FAILURE",
        }
    }

    /// Whether the caller (not the backend or tool servers) caused this error.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AgentError::EmptyMessage
                | AgentError::InvalidMaxIterations(_)
                | AgentError::UnknownVendor(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialog_error_codes_are_stable() {
        assert_eq!(DialogError::EmptyMessage.code(), "EMPTY_MESSAGE");
        assert_eq!(
            DialogError::BothCompressionThresholdsSet.code(),
            "BOTH_COMPRESSION_THRESHOLDS_SET"
        );
        assert_eq!(DialogError::DialogCompleted(3).code(), "DIALOG_COMPLETED");
        assert_eq!(
            DialogError::MaxRoundsExceeded { current: 3, max: 3 }.code(),
            "MAX_ROUNDS_EXCEEDED"
        );
    }

    #[test]
    fn test_dialog_error_classification() {
        assert!(DialogError::EmptyMessage.is_client_error());
        assert!(DialogError::UnknownVendor("x".to_string()).is_client_error());
        assert!(!DialogError::Backend(LlmError::RateLimited).is_client_error());
        assert!(
            !DialogError::Store(SessionStoreError::Io("disk full".to_string()))
                .is_client_error()
        );
    }

    #[test]
    fn test_dialog_error_display() {
        let err = DialogError::MaxRoundsExceeded { current: 5, max: 3 };
        assert_eq!(err.to_string(), "round limit exceeded: 5 of 3");

        let err = DialogError::InvalidMaxRounds(0);
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_agent_error_codes() {
        assert_eq!(AgentError::NoToolsAvailable.code(), "NO_TOOLS_AVAILABLE");
        assert!(!AgentError::NoToolsAvailable.is_client_error());
        assert!(AgentError::EmptyMessage.is_client_error());
        assert_eq!(
            AgentError::InvalidMaxIterations(0).code(),
            "INVALID_MAX_ITERATIONS"
        );
        assert!(AgentError::InvalidMaxIterations(0).is_client_error());
    }
}
