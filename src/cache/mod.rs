// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Response Cache Module
//!
//! Optional caching of upstream GET responses.
//!
//! This module provides:
//! - The `ResponseCache` trait used by the LiquidPlanner client
//! - An in-process TTL cache
//! - A Redis-backed cache shared between replicas
//! - A no-op cache used when caching is disabled
//!
//! Backend failures never fail a request: they are logged and treated as misses.

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

// =============================================================================
// Cache Trait
// =============================================================================

/// Storage for cached JSON responses.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Backend name for logging and stats.
    fn backend(&self) -> &'static str;

    /// Get a cached value if present and not expired.
    async fn get(&self, key: &str) -> Option<Value>;

    /// Store a value for `ttl`.
    async fn set(&self, key: &str, value: &Value, ttl: Duration);

    /// Remove a single key.
    async fn delete(&self, key: &str);

    /// Remove every key starting with `prefix`.
    async fn invalidate_prefix(&self, prefix: &str);

    /// Hit/miss statistics.
    async fn stats(&self) -> CacheStats;
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Backend in use (memory, redis, disabled)
    pub backend: &'static str,
    /// Live entries, when the backend can count them cheaply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<usize>,
    /// Total cache hits
    pub hits: u64,
    /// Total cache misses
    pub misses: u64,
    /// hits / (hits + misses), 0 when unused
    pub hit_rate: f64,
}

impl CacheStats {
    pub(crate) fn new(
        backend: &'static str,
        entries: Option<usize>,
        hits: u64,
        misses: u64,
    ) -> Self {
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };
        Self {
            backend,
            entries,
            hits,
            misses,
            hit_rate,
        }
    }
}

// =============================================================================
// Disabled Cache
// =============================================================================

/// Cache used when `CACHE_ENABLED=false`: stores nothing.
#[derive(Debug, Default)]
pub struct NoopCache;

#[async_trait]
impl ResponseCache for NoopCache {
    fn backend(&self) -> &'static str {
        "disabled"
    }

    async fn get(&self, _key: &str) -> Option<Value> {
        None
    }

    async fn set(&self, _key: &str, _value: &Value, _ttl: Duration) {}

    async fn delete(&self, _key: &str) {}

    async fn invalidate_prefix(&self, _prefix: &str) {}

    async fn stats(&self) -> CacheStats {
        CacheStats::new("disabled", None, 0, 0)
    }
}

// =============================================================================
// Construction
// =============================================================================

/// Build the cache backend selected by configuration.
///
/// A Redis URL that cannot be reached falls back to the memory cache.
pub async fn build_cache(config: &Config) -> Arc<dyn ResponseCache> {
    if !config.cache_enabled {
        info!("Response caching disabled");
        return Arc::new(NoopCache);
    }

    if let Some(url) = &config.redis_url {
        match RedisCache::connect(url).await {
            Ok(cache) => {
                info!("Connected to Redis cache");
                return Arc::new(cache);
            }
            Err(e) => {
                warn!(
                    code = e.code(),
                    error = %e,
                    "Failed to connect to Redis, using in-memory cache"
                );
            }
        }
    }

    info!(ttl_secs = config.cache_ttl, "Using in-memory response cache");
    Arc::new(MemoryCache::new())
}
