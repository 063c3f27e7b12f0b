// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
mod health;
mod metrics;

pub use health::{health, health_live, health_ready, AppState};
pub use metrics::metrics_handler;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::mcp::{mcp_router, McpState, ToolRegistry};
use crate::metrics::Metrics;

/// Full HTTP application: health probes, metrics and the MCP endpoints.
pub fn app_router(registry: Arc<ToolRegistry>, app_state: AppState, metrics: Metrics) -> Router {
    Router::new()
        .route("/health", get(health).with_state(app_state.clone()))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready).with_state(app_state))
        .route("/metrics", get(metrics_handler).with_state(metrics))
        .merge(mcp_router(McpState::new(registry)))
        .layer(TraceLayer::new_for_http())
}
