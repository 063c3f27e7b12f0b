// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Tool Registry
//!
//! Registry for MCP tools with async execution.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::mcp::protocol::{McpError, ToolCallRequest, ToolCallResponse, ToolDefinition};
use crate::metrics::Metrics;

// =============================================================================
// Tool Context
// =============================================================================

/// Per-call context handed to tools.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Correlation id for logs
    pub request_id: String,

    /// Transport the call arrived on (http, stdio)
    pub transport: &'static str,
}

impl ToolContext {
    pub fn new(transport: &'static str) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            transport,
        }
    }
}

// =============================================================================
// Tool Trait
// =============================================================================

/// A callable tool. Implementations hold whatever client they need and
/// turn argument maps into a single JSON text block.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable snake_case name clients call the tool by.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema (draft 7 subset) describing `arguments`.
    fn input_schema(&self) -> serde_json::Value;

    /// Run the tool. Failures come back with `is_error` set.
    async fn execute(
        &self,
        args: HashMap<String, serde_json::Value>,
        ctx: ToolContext,
    ) -> ToolCallResponse;
}

// =============================================================================
// Tool Registry
// =============================================================================

/// Registry of available MCP tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    metrics: Option<Metrics>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            metrics: None,
        }
    }

    /// Record tool call counts and durations into `metrics`.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Register a tool in the registry.
    ///
    /// If a tool with the same name already exists, it will be replaced.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all registered tools, sorted by name.
    pub fn list(&self) -> Vec<ToolDefinition> {
        let mut tools: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            })
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Look up and execute a tool, logging and recording the outcome.
    pub async fn call(
        &self,
        request: ToolCallRequest,
        ctx: ToolContext,
    ) -> Result<ToolCallResponse, McpError> {
        let tool = self.get(&request.name).ok_or_else(|| {
            warn!(tool = %request.name, "Tool not found");
            McpError::tool_not_found(&request.name)
        })?;

        info!(
            tool = %request.name,
            request_id = %ctx.request_id,
            transport = ctx.transport,
            "Executing tool"
        );

        let started = Instant::now();
        let response = tool.execute(request.arguments, ctx.clone()).await;
        let elapsed = started.elapsed();

        if let Some(metrics) = &self.metrics {
            metrics.record_tool_call(&request.name, elapsed, response.is_error);
        }

        if response.is_error {
            warn!(
                tool = %request.name,
                request_id = %ctx.request_id,
                duration_ms = elapsed.as_millis() as u64,
                "Tool call failed"
            );
        } else {
            info!(
                tool = %request.name,
                request_id = %ctx.request_id,
                duration_ms = elapsed.as_millis() as u64,
                "Tool call completed"
            );
        }

        Ok(response)
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct StubTool {
        name: String,
    }

    #[async_trait]
    impl Tool for StubTool {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "Stub tool"
        }

        fn input_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {}
            })
        }

        async fn execute(
            &self,
            _args: HashMap<String, serde_json::Value>,
            _ctx: ToolContext,
        ) -> ToolCallResponse {
            ToolCallResponse::text(format!("ran {}", self.name))
        }
    }

    #[test]
    fn test_registry_register_and_get() {
        let mut registry = ToolRegistry::new();
        registry.register(StubTool {
            name: "test_tool".to_string(),
        });

        assert_eq!(registry.len(), 1);
        assert!(registry.get("test_tool").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_registry_list_sorted() {
        let mut registry = ToolRegistry::new();
        registry.register(StubTool {
            name: "zeta".to_string(),
        });
        registry.register(StubTool {
            name: "alpha".to_string(),
        });

        let tools = registry.list();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].name, "alpha");
        assert_eq!(tools[1].name, "zeta");
    }

    #[tokio::test]
    async fn test_call_records_metrics() {
        let metrics = Metrics::new();
        let mut registry = ToolRegistry::new().with_metrics(metrics.clone());
        registry.register(StubTool {
            name: "echo".to_string(),
        });

        let request = ToolCallRequest {
            name: "echo".to_string(),
            arguments: HashMap::new(),
        };
        let response = registry.call(request, ToolContext::new("test")).await.unwrap();
        assert!(!response.is_error);
        assert!(metrics.encode().contains("tool=\"echo\""));
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let registry = ToolRegistry::new();
        let request = ToolCallRequest {
            name: "missing".to_string(),
            arguments: HashMap::new(),
        };
        let err = registry.call(request, ToolContext::new("test")).await.unwrap_err();
        assert!(err.message.contains("missing"));
    }
}
