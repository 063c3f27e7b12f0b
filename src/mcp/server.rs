// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! MCP Server Handler
//!
//! rmcp `ServerHandler` over the tool registry. The same handler serves
//! the stdio transport and the streamable HTTP endpoint at `POST /mcp`.

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, JsonObject,
    ListToolsResult, PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
    Tool as McpTool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use rmcp::{ErrorData, ServerHandler};
use serde_json::Value;
use std::sync::Arc;

use super::protocol::{ContentBlock, ToolCallRequest, ToolCallResponse, ToolDefinition};
use super::tools::{ToolContext, ToolRegistry};

/// Protocol revision advertised by `initialize`.
pub const PROTOCOL_VERSION: ProtocolVersion = ProtocolVersion::V_2025_03_26;

/// Streamable HTTP service mounted at `/mcp`.
pub type McpHttpService = StreamableHttpService<LiquidPlannerMcp, LocalSessionManager>;

// =============================================================================
// Handler
// =============================================================================

/// MCP server exposing the registered LiquidPlanner tools.
#[derive(Clone)]
pub struct LiquidPlannerMcp {
    registry: Arc<ToolRegistry>,
    transport: &'static str,
}

impl LiquidPlannerMcp {
    /// `transport` labels tool calls in logs (`stdio`, `http`).
    pub fn new(registry: Arc<ToolRegistry>, transport: &'static str) -> Self {
        Self {
            registry,
            transport,
        }
    }
}

fn to_mcp_tool(definition: ToolDefinition) -> McpTool {
    let schema = match definition.input_schema {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    };
    McpTool::new(definition.name, definition.description, Arc::new(schema))
}

fn to_call_result(response: ToolCallResponse) -> CallToolResult {
    let content = response
        .content
        .into_iter()
        .map(|ContentBlock::Text { text }| Content::text(text))
        .collect();
    if response.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

impl ServerHandler for LiquidPlannerMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: PROTOCOL_VERSION,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                title: Some("LiquidPlanner MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: Some(
                    "Time entries, tasks, projects and custom fields of a LiquidPlanner \
                     workspace"
                        .to_string(),
                ),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Tools operate on the configured LiquidPlanner workspace. \
                 Every tool answers with a single JSON text block."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let tools = self.registry.list().into_iter().map(to_mcp_tool).collect();
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let call = ToolCallRequest {
            name: request.name.to_string(),
            arguments: request.arguments.unwrap_or_default().into_iter().collect(),
        };

        // an unknown tool is a protocol error; tool failures travel in the result
        match self.registry.call(call, ToolContext::new(self.transport)).await {
            Ok(response) => Ok(to_call_result(response)),
            Err(e) => Err(ErrorData::invalid_params(e.message, e.details)),
        }
    }
}

// =============================================================================
// HTTP Transport
// =============================================================================

/// Stateless streamable HTTP service: every POST is answered on its own,
/// notifications get `202 Accepted`.
pub fn http_service(registry: Arc<ToolRegistry>) -> McpHttpService {
    let config = StreamableHttpServerConfig {
        stateful_mode: false,
        sse_keep_alive: None,
        ..Default::default()
    };
    StreamableHttpService::new(
        move || Ok(LiquidPlannerMcp::new(registry.clone(), "http")),
        Arc::new(LocalSessionManager::default()),
        config,
    )
}

// =============================================================================
// Tests
// =============================================================================
