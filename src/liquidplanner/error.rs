// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! LiquidPlanner Errors
//!
//! Error taxonomy for upstream calls and local validation. Every variant
//! carries a stable error code that is surfaced to MCP clients.

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, Error)]
pub enum LpError {
    #[error("{message}")]
    Auth { status: u16, message: String },

    #[error("{message}")]
    NotFound {
        message: String,
        resource: Option<String>,
    },

    #[error("{message}")]
    RateLimited {
        message: String,
        retry_after: Option<u64>,
    },

    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
        status: Option<u16>,
    },

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Custom field '{field}': {message}")]
    CustomField { field: String, message: String },

    #[error("Time entry for task {task_id}: {message}")]
    TimeEntry { task_id: u64, message: String },

    #[error("CSV line {line}: {message}")]
    Csv { line: usize, message: String },

    #[error("Cache {operation} failed: {message}")]
    Cache { operation: String, message: String },

    #[error("Configuration error for {key}: {message}")]
    Config { key: String, message: String },

    #[error("Invalid response body: {0}")]
    Decode(String),
}

/// Serialized form of an error returned to MCP clients.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub error: &'static str,
    pub message: String,
    pub details: Value,
}

impl LpError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
            status: None,
        }
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
            status: None,
        }
    }

    pub fn cache(operation: impl Into<String>, message: impl std::fmt::Display) -> Self {
        LpError::Cache {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        Self::NotFound {
            message: format!("Resource not found: {}", resource),
            resource: Some(resource),
        }
    }

    /// Stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            LpError::Auth { .. } => "LIQUIDPLANNER_AUTH_ERROR",
            LpError::NotFound { .. } => "LIQUIDPLANNER_NOT_FOUND_ERROR",
            LpError::RateLimited { .. } => "LIQUIDPLANNER_RATE_LIMIT_ERROR",
            LpError::Validation { .. } => "LIQUIDPLANNER_VALIDATION_ERROR",
            LpError::Api { .. } | LpError::Decode(_) => "LIQUIDPLANNER_API_ERROR",
            LpError::Timeout { .. } => "LIQUIDPLANNER_TIMEOUT_ERROR",
            LpError::Connection(_) => "LIQUIDPLANNER_CONNECTION_ERROR",
            LpError::CustomField { .. } => "LIQUIDPLANNER_CUSTOM_FIELD_ERROR",
            LpError::TimeEntry { .. } => "LIQUIDPLANNER_TIME_ENTRY_ERROR",
            LpError::Csv { .. } => "LIQUIDPLANNER_CSV_ERROR",
            LpError::Cache { .. } => "LIQUIDPLANNER_CACHE_ERROR",
            LpError::Config { .. } => "LIQUIDPLANNER_CONFIG_ERROR",
        }
    }

    /// HTTP status of the upstream response, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            LpError::Auth { status, .. } | LpError::Api { status, .. } => Some(*status),
            LpError::NotFound { .. } => Some(404),
            LpError::RateLimited { .. } => Some(429),
            LpError::Validation { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            LpError::RateLimited { .. } | LpError::Timeout { .. } | LpError::Connection(_) => {
                true
            }
            LpError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        let details = match self {
            LpError::Auth { status, .. } | LpError::Api { status, .. } => {
                json!({ "status_code": status })
            }
            LpError::NotFound { resource, .. } => json!({ "resource": resource }),
            LpError::RateLimited { retry_after, .. } => json!({ "retry_after": retry_after }),
            LpError::Validation { field, status, .. } => {
                json!({ "field": field, "status_code": status })
            }
            LpError::Timeout { seconds } => json!({ "timeout_duration": seconds }),
            LpError::CustomField { field, .. } => json!({ "field_name": field }),
            LpError::TimeEntry { task_id, .. } => json!({ "task_id": task_id }),
            LpError::Csv { line, .. } => json!({ "line_number": line }),
            LpError::Cache { operation, .. } => json!({ "cache_operation": operation }),
            LpError::Config { key, .. } => json!({ "config_key": key }),
            LpError::Connection(_) | LpError::Decode(_) => json!({}),
        };

        ErrorPayload {
            error: self.code(),
            message: self.to_string(),
            details,
        }
    }

    /// Build the error for a non-success upstream response.
    pub fn from_response(status: u16, body: &Value, retry_after_header: Option<u64>) -> Self {
        let detail = extract_message(body);

        match status {
            401 => LpError::Auth {
                status,
                message: format!("Authentication failed: {}", detail),
            },
            403 => LpError::Auth {
                status,
                message: format!("Access forbidden: {}", detail),
            },
            404 => LpError::NotFound {
                message: format!("Resource not found: {}", detail),
                resource: None,
            },
            429 => LpError::RateLimited {
                message: format!("Rate limit exceeded: {}", detail),
                retry_after: retry_after_header
                    .or_else(|| body.get("retry_after").and_then(Value::as_u64)),
            },
            400..=499 => LpError::Validation {
                message: format!("Client error: {}", detail),
                field: None,
                status: Some(status),
            },
            500..=599 => LpError::Api {
                status,
                message: format!("Server error: {}", detail),
            },
            _ => LpError::Api {
                status,
                message: format!("Unexpected response: {}", detail),
            },
        }
    }
}

impl From<reqwest::Error> for LpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LpError::Timeout { seconds: 0 }
        } else if e.is_decode() {
            LpError::Decode(e.to_string())
        } else {
            LpError::Connection(e.to_string())
        }
    }
}

/// Pull a human-readable message out of an upstream error body.
fn extract_message(body: &Value) -> String {
    if let Some(errors) = body.get("errors") {
        return match errors {
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect::<Vec<_>>()
                .join("; "),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
    }

    for key in ["error", "message"] {
        if let Some(v) = body.get(key) {
            return v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
        }
    }

    "API request failed".to_string()
}

// =============================================================================
// Tests
// =============================================================================
