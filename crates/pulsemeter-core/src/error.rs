//! Shared error type across pulsemeter crates.

use thiserror::Error;

/// Stable error codes surfaced in logs and HTTP responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid configuration.
    BadConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Unknown event kind at a text boundary.
    UnknownEventKind,
    /// External collaborator failed.
    Collaborator,
    /// External collaborator did not answer in time.
    Timeout,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::UnknownEventKind => "UNKNOWN_EVENT_KIND",
            ErrorCode::Collaborator => "COLLABORATOR",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MeterError>;

/// Unified error type used by core and engine.
#[derive(Debug, Error)]
pub enum MeterError {
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("unknown event kind: {0}")]
    UnknownEventKind(String),
    #[error("collaborator {name} failed: {reason}")]
    Collaborator { name: &'static str, reason: String },
    #[error("collaborator {0} timed out")]
    Timeout(&'static str),
    #[error("internal: {0}")]
    Internal(String),
}

impl MeterError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MeterError::BadConfig(_) => ErrorCode::BadConfig,
            MeterError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            MeterError::UnknownEventKind(_) => ErrorCode::UnknownEventKind,
            MeterError::Collaborator { .. } => ErrorCode::Collaborator,
            MeterError::Timeout(_) => ErrorCode::Timeout,
            MeterError::Internal(_) => ErrorCode::Internal,
        }
    }
}
