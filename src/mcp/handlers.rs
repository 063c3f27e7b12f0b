// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! MCP HTTP Handlers
//!
//! REST-style endpoints (`/mcp/tools/list`, `/mcp/tools/call`) and the
//! MCP streamable HTTP endpoint (`POST /mcp`).

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use super::protocol::{
    McpError, ToolCallRequest, ToolCallResponse, ToolsListRequest, ToolsListResponse,
};
use super::server::{http_service, PROTOCOL_VERSION};
use super::tools::{ToolContext, ToolRegistry};

const TRANSPORT: &str = "http";

// =============================================================================
// App State
// =============================================================================

/// Shared application state for MCP handlers.
#[derive(Clone)]
pub struct McpState {
    /// Tool registry
    pub registry: Arc<ToolRegistry>,
}

impl McpState {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /mcp/tools/list
///
/// List all available MCP tools.
async fn handle_tools_list(
    State(state): State<McpState>,
    Json(request): Json<ToolsListRequest>,
) -> impl IntoResponse {
    info!(cursor = ?request.cursor, "Handling tools/list request");

    Json(ToolsListResponse {
        tools: state.registry.list(),
        next_cursor: None,
    })
}

/// POST /mcp/tools/call
///
/// Execute a tool by name. 404 for an unknown tool, 400 when the tool
/// reports an error.
async fn handle_tools_call(
    State(state): State<McpState>,
    Json(request): Json<ToolCallRequest>,
) -> impl IntoResponse {
    info!(tool = %request.name, "Handling tools/call request");

    match state
        .registry
        .call(request, ToolContext::new(TRANSPORT))
        .await
    {
        Ok(response) if response.is_error => (StatusCode::BAD_REQUEST, Json(response)),
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(McpError { message, .. }) => {
            (StatusCode::NOT_FOUND, Json(ToolCallResponse::error(message)))
        }
    }
}

/// Health check for MCP endpoints.
async fn handle_mcp_health(State(state): State<McpState>) -> impl IntoResponse {
    if state.registry.is_empty() {
        warn!("MCP health requested with no tools registered");
    }
    Json(json!({
        "status": "ok",
        "service": "liquidplanner-mcp",
        "protocol_version": PROTOCOL_VERSION,
        "tools": state.registry.len(),
    }))
}

// =============================================================================
// Router
// =============================================================================

/// Create the MCP router with all endpoints. `POST /mcp` is served by
/// rmcp; the REST endpoints share its registry.
pub fn mcp_router(state: McpState) -> Router {
    Router::new()
        .route_service("/mcp", http_service(state.registry.clone()))
        .route("/mcp/tools/list", post(handle_tools_list))
        .route("/mcp/tools/call", post(handle_tools_call))
        .route(
            "/mcp/health",
            post(handle_mcp_health).get(handle_mcp_health),
        )
        .with_state(state)
}

// =============================================================================
// Tests
// =============================================================================
