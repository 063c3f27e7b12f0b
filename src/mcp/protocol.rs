// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! MCP Protocol Types
//!
//! Wire types for `tools/list` and `tools/call`. The REST endpoints
//! speak them directly and the rmcp handler converts from them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::liquidplanner::LpError;

// =============================================================================
// Requests
// =============================================================================

/// `tools/list` parameters. The tool set is small, so the cursor is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsListRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// `tools/call` parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    /// Missing arguments deserialize as an empty map
    #[serde(default)]
    pub arguments: HashMap<String, Value>,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsListResponse {
    pub tools: Vec<ToolDefinition>,
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Result of a tool call. Tool failures travel here with `isError` set,
/// never as transport errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResponse {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError", alias = "is_error", default)]
    pub is_error: bool,
}

impl ToolCallResponse {
    fn single(text: String, is_error: bool) -> Self {
        Self {
            content: vec![ContentBlock::Text { text }],
            is_error,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::single(text.into(), false)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::single(message.into(), true)
    }

    /// Pretty-printed JSON as a single text block.
    pub fn json<T: Serialize>(data: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::single(serde_json::to_string_pretty(data)?, false))
    }

    /// Error response carrying the `{error, message, details}` payload.
    pub fn from_error(error: &LpError) -> Self {
        let payload = error.to_payload();
        match serde_json::to_string_pretty(&payload) {
            Ok(text) => Self::single(text, true),
            Err(_) => Self::error(payload.message),
        }
    }

    /// Text of the first content block.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
        })
    }
}

/// A tool as advertised to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Tool output. Every LiquidPlanner tool answers with one text block
/// holding JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
}

// =============================================================================
// Errors
// =============================================================================

/// Dispatch failure raised before any tool runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpError {
    pub code: McpErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum McpErrorCode {
    ToolNotFound,
}

impl McpError {
    pub fn tool_not_found(name: &str) -> Self {
        Self {
            code: McpErrorCode::ToolNotFound,
            message: format!("Unknown tool: {}", name),
            details: Some(serde_json::json!({ "tool": name })),
        }
    }
}
