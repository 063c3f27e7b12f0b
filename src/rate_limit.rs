// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Rate Limiting
//!
//! Sliding-window limiter for outbound LiquidPlanner requests.
//!
//! The upstream API allows a fixed number of requests per period
//! (`LP_RATE_LIMIT` per `LP_RATE_LIMIT_PERIOD_SECS`). Callers use
//! [`RateLimiter::acquire`], which waits for a free slot instead of failing.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

// =============================================================================
// Rate Limit Result
// =============================================================================

/// Result of a rate limit check.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,

    /// Current count in the window
    pub current: u32,

    /// Maximum allowed in the window
    pub limit: u32,

    /// When the oldest request leaves the window
    pub reset_at: DateTime<Utc>,

    /// Time until a slot frees up, in milliseconds
    pub retry_after_ms: i64,
}

impl RateLimitResult {
    fn allowed(current: u32, limit: u32, reset_at: DateTime<Utc>) -> Self {
        Self {
            allowed: true,
            current,
            limit,
            reset_at,
            retry_after_ms: 0,
        }
    }

    fn denied(current: u32, limit: u32, reset_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let retry_after = (reset_at - now).num_milliseconds().max(1);
        Self {
            allowed: false,
            current,
            limit,
            reset_at,
            retry_after_ms: retry_after,
        }
    }
}

// =============================================================================
// Rate Limit Bucket
// =============================================================================

/// A sliding window rate limit bucket.
#[derive(Debug, Clone)]
struct RateBucket {
    /// Request timestamps in the current window
    timestamps: Vec<DateTime<Utc>>,

    /// Window duration
    window: Duration,

    /// Maximum requests in window
    limit: u32,
}

impl RateBucket {
    fn new(limit: u32, window: Duration) -> Self {
        Self {
            timestamps: Vec::new(),
            window,
            limit,
        }
    }

    /// Check if a request is allowed and record it if so.
    fn check_and_record(&mut self, now: DateTime<Utc>) -> RateLimitResult {
        let window_start = now - self.window;
        self.timestamps.retain(|t| *t > window_start);

        let current = self.timestamps.len() as u32;
        let reset_at = self
            .timestamps
            .first()
            .map(|t| *t + self.window)
            .unwrap_or(now + self.window);

        if current >= self.limit {
            return RateLimitResult::denied(current, self.limit, reset_at, now);
        }

        self.timestamps.push(now);

        RateLimitResult::allowed(current + 1, self.limit, reset_at)
    }

    /// Check without recording (peek).
    fn check(&self, now: DateTime<Utc>) -> RateLimitResult {
        let window_start = now - self.window;

        let live: Vec<_> = self
            .timestamps
            .iter()
            .filter(|t| **t > window_start)
            .collect();
        let current = live.len() as u32;
        let reset_at = live
            .first()
            .map(|t| **t + self.window)
            .unwrap_or(now + self.window);

        if current >= self.limit {
            RateLimitResult::denied(current, self.limit, reset_at, now)
        } else {
            RateLimitResult::allowed(current, self.limit, reset_at)
        }
    }
}

// =============================================================================
// Rate Limiter
// =============================================================================

/// Rate limiter configuration.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitConfig {
    /// Requests allowed per period
    pub requests_per_period: u32,

    /// Period length in seconds
    pub period_seconds: u64,
}

/// Shared limiter for all outbound requests of one workspace.
pub struct RateLimiter {
    bucket: Mutex<RateBucket>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn with_config(config: RateLimitConfig) -> Self {
        let window = Duration::seconds(config.period_seconds as i64);
        Self {
            bucket: Mutex::new(RateBucket::new(config.requests_per_period, window)),
            config,
        }
    }

    fn bucket(&self) -> MutexGuard<'_, RateBucket> {
        self.bucket.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check the limit and record the request when allowed.
    pub fn check(&self) -> RateLimitResult {
        self.bucket().check_and_record(Utc::now())
    }

    /// Peek at the current window without recording.
    pub fn peek(&self) -> RateLimitResult {
        self.bucket().check(Utc::now())
    }

    /// Wait until a request slot is available, then record it.
    ///
    /// Returns the number of times the caller had to wait.
    pub async fn acquire(&self) -> u32 {
        let mut waits = 0;
        loop {
            let result = self.check();
            if result.allowed {
                return waits;
            }

            waits += 1;
            warn!(
                current = result.current,
                limit = result.limit,
                wait_ms = result.retry_after_ms,
                "Rate limit reached, waiting for a free slot"
            );
            tokio::time::sleep(std::time::Duration::from_millis(
                result.retry_after_ms as u64,
            ))
            .await;
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Clear the window (for testing).
    #[cfg(test)]
    pub fn clear(&self) {
        self.bucket().timestamps.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================
