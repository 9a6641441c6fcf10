//! Shared error type across hel crates.

use thiserror::Error;

/// Caller-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The policy context is not a JSON object.
    InvalidPolicyContext,
    /// Configuration failed to parse or validate.
    InvalidConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// The external evaluator could not be run or understood.
    Evaluator,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidPolicyContext => "INVALID_POLICY_CONTEXT",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Evaluator => "EVALUATOR",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, HelError>;

/// Unified error type used by core and engine.
#[derive(Debug, Error)]
pub enum HelError {
    #[error("invalid policy context: {0}")]
    InvalidPolicyContext(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("evaluator: {0}")]
    Evaluator(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("internal: {0}")]
    Internal(String),
}

impl HelError {
    /// Map internal error to a stable caller-facing code.
    pub fn code(&self) -> ErrorCode {
        match self {
            HelError::InvalidPolicyContext(_) => ErrorCode::InvalidPolicyContext,
            HelError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            HelError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            HelError::Evaluator(_) | HelError::Io(_) | HelError::Json(_) => ErrorCode::Evaluator,
            HelError::Internal(_) => ErrorCode::Internal,
        }
    }
}
