//! Error types for controller API access.

use crate::normalize::SchemaError;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by [`super::ApiClient`]. Every variant is scoped to the
/// fetch or action that produced it; nothing here is process-fatal.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Request timeout
    #[error("request timeout after {0}s")]
    Timeout(u64),

    /// Connection or protocol failure before an HTTP status was received
    #[error("connection failed: {0}")]
    Transport(String),

    /// Success status but the body did not decode into the expected shape
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Non-success HTTP status, message extracted from the error body
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        /// Support-trace correlation id from the error body, when present
        request_id: Option<String>,
        /// Retry hint from the error body, when present
        retry_after_seconds: Option<f64>,
    },

    /// Top-level payload shape invalid; fatal for this fetch only
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Local input validation failed before any network call
    #[error("{0}")]
    Validation(String),
}

impl ClientError {
    /// Classify a reqwest error the way the health-check layer does: timeouts
    /// and body-decode failures are distinguished, everything else is a
    /// connection failure.
    pub fn from_reqwest(e: reqwest::Error, timeout_seconds: u64) -> Self {
        if e.is_timeout() {
            ClientError::Timeout(timeout_seconds)
        } else if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }

    /// Support-trace id for display next to a failed action, when one exists.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            ClientError::Http { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }

    /// Human retry hint derived from `retry_after_seconds`, e.g.
    /// `" Retry in 30s."`. Empty when no hint applies.
    pub fn retry_hint(&self) -> String {
        match self {
            ClientError::Http {
                retry_after_seconds: Some(seconds),
                ..
            } if *seconds > 0.0 => format!(" Retry in {}s.", seconds.round() as i64),
            _ => String::new(),
        }
    }
}

/// Extract a human-readable message from a structured error body with the
/// documented precedence: `detail` > legacy `error` > `title` + status >
/// generic fallback. All fields are optional and may be absent entirely.
pub fn read_api_error_message(payload: &Value, status: u16) -> String {
    let fallback = format!("Request failed ({status})");
    let Some(body) = payload.as_object() else {
        return fallback;
    };

    let field = |key: &str| -> Option<String> {
        body.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    if let Some(detail) = field("detail") {
        return detail;
    }
    if let Some(legacy) = field("error") {
        return legacy;
    }
    if let Some(title) = field("title") {
        return format!("{title} ({status})");
    }
    fallback
}

/// Extract the server's correlation `request_id` from an error body, when
/// present and non-blank.
pub fn read_api_request_id(payload: &Value) -> Option<String> {
    payload
        .as_object()
        .and_then(|body| body.get("request_id"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
