//! JSON output envelope for CLI responses.
//!
//! Every `--json` response has the same outer shape:
//!
//! ```json
//! { "status": "ok", "schema_version": "1", "command": "generate", "data": { .. }, "warnings": [] }
//! ```
//!
//! Errors use [`ErrorResponse`], which carries an [`ErrorInfo`] in place of `data`.
//! Field order is fixed and array contents are deterministic for identical input.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{OutputErrorCode, TestgenError};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Warnings
// ============================================================================

/// A non-fatal condition absorbed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Stable warning code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// File the warning applies to, `/`-separated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Warning {
    /// Create a warning without a file.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Warning {
            code: code.into(),
            message: message.into(),
            file: None,
        }
    }

    /// Attach a file path.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

// ============================================================================
// Response Envelope
// ============================================================================

/// Successful response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse<T> {
    /// Always `"ok"`.
    pub status: String,
    /// Schema version for forward compatibility.
    pub schema_version: String,
    /// Command that produced the response.
    pub command: String,
    /// Command-specific payload.
    pub data: T,
    /// Absorbed non-fatal conditions.
    pub warnings: Vec<Warning>,
}

impl<T> JsonResponse<T> {
    /// Create a successful response.
    pub fn ok(command: &str, data: T) -> Self {
        Self::ok_with_warnings(command, data, vec![])
    }

    /// Create a successful response carrying warnings.
    pub fn ok_with_warnings(command: &str, data: T, warnings: Vec<Warning>) -> Self {
        JsonResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            command: command.to_string(),
            data,
            warnings,
        }
    }
}

/// Error information for error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code, identical to the process exit code.
    pub code: u8,
    /// Stable error kind name.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    /// Create from a TestgenError.
    pub fn from_error(err: &TestgenError) -> Self {
        let code = OutputErrorCode::from(err);
        let details = match err {
            TestgenError::NotFound { path } => Some(serde_json::json!({ "path": path })),
            TestgenError::WriteError { path, .. } => {
                path.as_ref().map(|p| serde_json::json!({ "path": p }))
            }
            _ => None,
        };

        ErrorInfo {
            code: code.code(),
            kind: code.name().to_string(),
            message: err.to_string(),
            details,
        }
    }
}

/// Error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `"error"`.
    pub status: String,
    /// Schema version for forward compatibility.
    pub schema_version: String,
    /// Command that failed.
    pub command: String,
    /// What went wrong.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response for `command`.
    pub fn new(command: &str, err: &TestgenError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            command: command.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Payload {
        count: usize,
    }

    #[test]
    fn ok_envelope_has_status_first() {
        let response = JsonResponse::ok("scan", Payload { count: 3 });
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.starts_with("{\"status\":\"ok\""));
        assert!(json.contains("\"command\":\"scan\""));
        assert!(json.contains("\"count\":3"));
    }

    #[test]
    fn warnings_omit_missing_file() {
        let warning = Warning::new("W001", "design document missing");
        let json = serde_json::to_string(&warning).unwrap();
        assert!(!json.contains("file"));

        let warning = warning.with_file("pkg/broken.py");
        let json = serde_json::to_string(&warning).unwrap();
        assert!(json.contains("\"file\":\"pkg/broken.py\""));
    }

    #[test]
    fn error_response_carries_code_and_details() {
        let err = TestgenError::not_found("missing/src");
        let response = ErrorResponse::new("scan", &err);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"]["code"], 3);
        assert_eq!(value["error"]["kind"], "ResolutionError");
        assert_eq!(value["error"]["details"]["path"], "missing/src");
    }

    #[test]
    fn emit_writes_trailing_newline() {
        let mut buf = Vec::new();
        emit_response(&JsonResponse::ok("evaluate", Payload { count: 0 }), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with("}\n"));
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["data"]["count"], 0);
    }
}
