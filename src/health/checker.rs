// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::liquidplanner::LiquidPlannerClient;

/// Health checker for the LiquidPlanner API.
///
/// Periodically probes `/account` and tracks outages. Supports graceful
/// shutdown via broadcast channel.
pub struct HealthChecker {
    client: Arc<LiquidPlannerClient>,
    check_interval: Duration,
    current_state: Arc<AtomicBool>,
    outage_count: Arc<AtomicU64>,
}

impl HealthChecker {
    /// Create a new health checker.
    ///
    /// The upstream is considered unhealthy until the first probe succeeds.
    pub fn new(client: Arc<LiquidPlannerClient>, check_interval: Duration) -> Self {
        Self {
            client,
            check_interval,
            current_state: Arc::new(AtomicBool::new(false)),
            outage_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Run the health check loop until a shutdown signal is received.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        let mut interval = tokio::time::interval(self.check_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tracing::info!(
            base_url = %self.client.base_url(),
            workspace_id = self.client.workspace_id(),
            interval_secs = self.check_interval.as_secs(),
            "starting health checker"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.check_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("health checker received shutdown signal");
                    break;
                }
            }
        }

        tracing::info!("health checker stopped");
    }

    /// Probe the API once and update the shared state. Returns the new state.
    pub async fn check_once(&self) -> bool {
        let is_healthy = match self.client.get_account().await {
            Ok(_) => {
                tracing::trace!("liquidplanner health check passed");
                true
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    code = e.code(),
                    "liquidplanner health check failed"
                );
                false
            }
        };

        let was_healthy = self.current_state.swap(is_healthy, Ordering::SeqCst);
        self.client.metrics().set_upstream_health(is_healthy);

        if was_healthy && !is_healthy {
            let count = self.outage_count.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::warn!(
                event = "outage",
                total_outages = count,
                "liquidplanner API became unreachable"
            );
        } else if !was_healthy && is_healthy {
            tracing::info!(event = "recovery", "liquidplanner API reachable");
        }

        is_healthy
    }

    /// Check if the API is currently considered healthy.
    pub fn is_healthy(&self) -> bool {
        self.current_state.load(Ordering::SeqCst)
    }

    /// Number of healthy-to-unhealthy transitions observed.
    pub fn outage_count(&self) -> u64 {
        self.outage_count.load(Ordering::Relaxed)
    }

    /// Get an Arc clone of the health state for sharing with handlers.
    pub fn state(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.current_state)
    }
}
