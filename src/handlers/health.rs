// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared application state for health endpoints.
#[derive(Clone)]
pub struct AppState {
    /// LiquidPlanner API health (true = reachable)
    pub upstream_healthy: Arc<AtomicBool>,
    /// Flag indicating if we're shutting down
    pub shutting_down: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(upstream_healthy: Arc<AtomicBool>) -> Self {
        Self {
            upstream_healthy,
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    fn upstream_status(&self) -> &'static str {
        if self.upstream_healthy.load(Ordering::SeqCst) {
            "connected"
        } else {
            "disconnected"
        }
    }
}

/// Health check response body.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    liquidplanner_status: Option<&'static str>,
}

impl HealthResponse {
    fn status(status: &'static str) -> Self {
        Self {
            status,
            service: None,
            version: None,
            liquidplanner_status: None,
        }
    }
}

/// Service health summary.
///
/// Always 200; `status` is `degraded` while the API is unreachable.
///
/// # Endpoint
/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Response {
    let upstream = state.upstream_status();
    let response = HealthResponse {
        status: if upstream == "connected" { "ok" } else { "degraded" },
        service: Some(env!("CARGO_PKG_NAME")),
        version: Some(env!("CARGO_PKG_VERSION")),
        liquidplanner_status: Some(upstream),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Kubernetes liveness probe endpoint.
///
/// Returns 200 OK if the process is alive.
///
/// # Endpoint
/// `GET /health/live`
pub async fn health_live() -> Response {
    (StatusCode::OK, Json(HealthResponse::status("ok"))).into_response()
}

/// Kubernetes readiness probe endpoint.
///
/// Returns 503 while shutting down. An unreachable API reports `degraded`
/// with 200: tool calls still answer, with upstream errors.
///
/// # Endpoint
/// `GET /health/ready`
pub async fn health_ready(State(state): State<AppState>) -> Response {
    if state.shutting_down.load(Ordering::SeqCst) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse::status("shutting_down")),
        )
            .into_response();
    }

    let upstream = state.upstream_status();
    let response = HealthResponse {
        status: if upstream == "connected" { "ok" } else { "degraded" },
        service: None,
        version: None,
        liquidplanner_status: Some(upstream),
    };
    (StatusCode::OK, Json(response)).into_response()
}
