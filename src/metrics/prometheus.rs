// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, IntCounter, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Prometheus metrics for the MCP server.
///
/// Thread-safe metrics registry for tracking tool calls, upstream requests,
/// cache efficiency, rate-limit pressure and upstream health.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    /// Tool call counter: mcp_tool_calls_total{tool, status}
    tool_calls_total: CounterVec,

    /// Tool call duration: mcp_tool_call_duration_seconds{tool}
    tool_call_duration: HistogramVec,

    /// Upstream request counter: liquidplanner_requests_total{method, status}
    upstream_requests_total: CounterVec,

    /// Cache events: liquidplanner_cache_events_total{event}
    cache_events_total: CounterVec,

    /// Times a request waited on the rate limiter
    rate_limit_waits_total: IntCounter,

    /// Upstream health gauge (1=up, 0=down)
    upstream_up: Gauge,
}

impl Metrics {
    /// Create a new metrics registry with all series registered.
    pub fn new() -> Self {
        let registry = Registry::new();

        let tool_calls_total = CounterVec::new(
            Opts::new("mcp_tool_calls_total", "Total number of MCP tool calls"),
            &["tool", "status"],
        )
        .expect("failed to create tool_calls_total counter");

        // Tool duration: buckets from 10ms to 60s, bulk imports can be slow
        let tool_call_duration = HistogramVec::new(
            HistogramOpts::new(
                "mcp_tool_call_duration_seconds",
                "Tool call duration in seconds",
            )
            .buckets(vec![
                0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
            ]),
            &["tool"],
        )
        .expect("failed to create tool_call_duration histogram");

        let upstream_requests_total = CounterVec::new(
            Opts::new(
                "liquidplanner_requests_total",
                "Total number of requests sent to LiquidPlanner",
            ),
            &["method", "status"],
        )
        .expect("failed to create upstream_requests_total counter");

        let cache_events_total = CounterVec::new(
            Opts::new("liquidplanner_cache_events_total", "Response cache hits and misses"),
            &["event"],
        )
        .expect("failed to create cache_events_total counter");

        let rate_limit_waits_total = IntCounter::new(
            "liquidplanner_rate_limit_waits_total",
            "Times an outbound request waited for a rate-limit slot",
        )
        .expect("failed to create rate_limit_waits_total counter");

        let upstream_up = Gauge::new(
            "liquidplanner_upstream_up",
            "LiquidPlanner API reachability (1=up, 0=down)",
        )
        .expect("failed to create upstream_up gauge");

        registry
            .register(Box::new(tool_calls_total.clone()))
            .expect("failed to register tool_calls_total");
        registry
            .register(Box::new(tool_call_duration.clone()))
            .expect("failed to register tool_call_duration");
        registry
            .register(Box::new(upstream_requests_total.clone()))
            .expect("failed to register upstream_requests_total");
        registry
            .register(Box::new(cache_events_total.clone()))
            .expect("failed to register cache_events_total");
        registry
            .register(Box::new(rate_limit_waits_total.clone()))
            .expect("failed to register rate_limit_waits_total");
        registry
            .register(Box::new(upstream_up.clone()))
            .expect("failed to register upstream_up");

        upstream_up.set(1.0);

        Self {
            registry: Arc::new(registry),
            tool_calls_total,
            tool_call_duration,
            upstream_requests_total,
            cache_events_total,
            rate_limit_waits_total,
            upstream_up,
        }
    }

    /// Record a finished tool call.
    pub fn record_tool_call(&self, tool: &str, duration: Duration, is_error: bool) {
        let status = if is_error { "error" } else { "ok" };
        self.tool_calls_total
            .with_label_values(&[tool, status])
            .inc();
        self.tool_call_duration
            .with_label_values(&[tool])
            .observe(duration.as_secs_f64());
    }

    /// Record an upstream response status (0 when no response arrived).
    pub fn record_upstream_request(&self, method: &str, status: u16) {
        let status_str = status.to_string();
        self.upstream_requests_total
            .with_label_values(&[method, &status_str])
            .inc();
    }

    pub fn record_cache_hit(&self) {
        self.cache_events_total.with_label_values(&["hit"]).inc();
    }

    pub fn record_cache_miss(&self) {
        self.cache_events_total.with_label_values(&["miss"]).inc();
    }

    pub fn record_rate_limit_waits(&self, waits: u32) {
        self.rate_limit_waits_total.inc_by(waits as u64);
    }

    /// Set upstream health status.
    pub fn set_upstream_health(&self, healthy: bool) {
        self.upstream_up.set(if healthy { 1.0 } else { 0.0 });
    }

    /// Encode metrics in Prometheus text format.
    pub fn encode(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!(error = %e, "failed to encode metrics");
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
