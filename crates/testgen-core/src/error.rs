//! Error types and error code constants for testgen.
//!
//! `TestgenError` is the single error type surfaced by the command layer.
//! Subsystem errors (scanning, synthesis, evaluation, configuration) bridge
//! into it through `From` impls, and every variant maps to a stable
//! [`OutputErrorCode`] that doubles as the process exit code.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad flag value, malformed config)
//! - `3`: Resolution errors (source root, artifact directory, or file not found)
//! - `4`: Write errors (failed to write artifacts or the metrics report)
//! - `10`: Internal errors (bugs, unexpected state)
//!
//! Per-file and per-declaration failures never reach this type: the pipeline
//! absorbs them and degrades to skip-and-continue or template fallback.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::config::ConfigError;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output and process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller.
    InvalidArguments = 2,
    /// A required path does not exist.
    ResolutionError = 3,
    /// Failed to write artifacts or the report.
    WriteError = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Stable name used in JSON error responses.
    pub fn name(&self) -> &'static str {
        match self {
            OutputErrorCode::InvalidArguments => "InvalidArguments",
            OutputErrorCode::ResolutionError => "ResolutionError",
            OutputErrorCode::WriteError => "WriteError",
            OutputErrorCode::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for command output.
#[derive(Debug, Error)]
pub enum TestgenError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// A required directory or file does not exist.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// Failed to write an artifact or report.
    #[error("write error: {message}")]
    WriteError {
        message: String,
        path: Option<String>,
    },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl From<&TestgenError> for OutputErrorCode {
    fn from(err: &TestgenError) -> Self {
        match err {
            TestgenError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            TestgenError::NotFound { .. } => OutputErrorCode::ResolutionError,
            TestgenError::WriteError { .. } => OutputErrorCode::WriteError,
            TestgenError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<TestgenError> for OutputErrorCode {
    fn from(err: TestgenError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Bridge: ConfigError -> TestgenError
// ============================================================================

impl From<ConfigError> for TestgenError {
    fn from(err: ConfigError) -> Self {
        TestgenError::InvalidArguments {
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl TestgenError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        TestgenError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        TestgenError::NotFound { path: path.into() }
    }

    /// Create a write error for a specific path.
    pub fn write(path: impl Into<String>, err: &io::Error) -> Self {
        let path = path.into();
        TestgenError::WriteError {
            message: format!("{}: {}", path, err),
            path: Some(path),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        TestgenError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
