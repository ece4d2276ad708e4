// Error types shared by the gateway, the upstream client and the configuration layer

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

// Failure category surfaced to gateway callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    AuthFailure,
    UpstreamFailure,
    InvalidQuery,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::AuthFailure => "AUTH_FAILURE",
            ErrorKind::UpstreamFailure => "UPSTREAM_FAILURE",
            ErrorKind::InvalidQuery => "INVALID_QUERY",
        };
        f.write_str(name)
    }
}

/// Structured failure produced at the point where an upstream or transport
/// call fails. `detail` carries the provider's error body when one was
/// returned, otherwise the transport error message.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}: {detail}")]
pub struct GatewayError {
    pub kind: ErrorKind,
    pub detail: Value,
}

impl GatewayError {
    pub fn new(kind: ErrorKind, detail: impl Into<Value>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn auth(detail: impl Into<Value>) -> Self {
        Self::new(ErrorKind::AuthFailure, detail)
    }

    pub fn upstream(detail: impl Into<Value>) -> Self {
        Self::new(ErrorKind::UpstreamFailure, detail)
    }

    pub fn invalid_query(detail: impl Into<Value>) -> Self {
        Self::new(ErrorKind::InvalidQuery, detail)
    }

    // Re-tags the failure while keeping its diagnostic detail
    pub fn with_kind(self, kind: ErrorKind) -> Self {
        Self { kind, ..self }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("HTTP client initialization error: {0}")]
    HttpClient(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_serializes_in_screaming_snake_case() {
        assert_eq!(
            serde_json::to_value(ErrorKind::UpstreamFailure).unwrap(),
            json!("UPSTREAM_FAILURE")
        );
        assert_eq!(ErrorKind::AuthFailure.to_string(), "AUTH_FAILURE");
    }

    #[test]
    fn test_display_includes_kind_and_detail() {
        let err = GatewayError::upstream(json!({"error_description": "bad date"}));
        let rendered = err.to_string();
        assert!(rendered.starts_with("UPSTREAM_FAILURE"));
        assert!(rendered.contains("bad date"));
    }

    #[test]
    fn test_with_kind_keeps_detail() {
        let err = GatewayError::upstream("connection reset").with_kind(ErrorKind::AuthFailure);
        assert_eq!(err.kind, ErrorKind::AuthFailure);
        assert_eq!(err.detail, json!("connection reset"));
    }
}
