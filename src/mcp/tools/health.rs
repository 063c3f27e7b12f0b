// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! health_check tool.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use super::args::Args;
use super::registry::{Tool, ToolContext};
use crate::liquidplanner::LiquidPlannerClient;
use crate::mcp::protocol::ToolCallResponse;

pub const SERVER_NAME: &str = "LiquidPlanner MCP Server";

pub struct HealthCheckTool {
    client: Arc<LiquidPlannerClient>,
}

impl HealthCheckTool {
    pub fn new(client: Arc<LiquidPlannerClient>) -> Self {
        Self { client }
    }

    /// Probe the API and build the status report. Never fails.
    pub async fn report(&self) -> Value {
        let timestamp = Utc::now().to_rfc3339();
        match self.client.get_account().await {
            Ok(account) => {
                self.client.metrics().set_upstream_health(true);
                json!({
                    "status": "healthy",
                    "server": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                    "liquidplanner_api": "connected",
                    "workspace_id": self.client.workspace_id(),
                    "account": account.user_name.unwrap_or_else(|| "Unknown".to_string()),
                    "cache": self.client.cache().stats().await,
                    "rate_limit": self.client.rate_limit_status(),
                    "timestamp": timestamp,
                })
            }
            Err(e) => {
                warn!(error = %e, "Health check failed");
                self.client.metrics().set_upstream_health(false);
                json!({
                    "status": "unhealthy",
                    "server": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                    "liquidplanner_api": "disconnected",
                    "workspace_id": self.client.workspace_id(),
                    "error": e.to_payload(),
                    "timestamp": timestamp,
                })
            }
        }
    }
}

#[async_trait]
impl Tool for HealthCheckTool {
    fn name(&self) -> &str {
        "health_check"
    }

    fn description(&self) -> &str {
        "Check the health status of the LiquidPlanner MCP server."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _args: Args, _ctx: ToolContext) -> ToolCallResponse {
        // an unhealthy upstream is a valid answer, not a tool failure
        ToolCallResponse::json(&self.report().await).unwrap_or_else(|e| {
            ToolCallResponse::error(format!("Failed to serialize result: {}", e))
        })
    }
}
