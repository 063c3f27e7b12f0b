// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Redis-backed response cache.

use ::redis::aio::MultiplexedConnection;
use ::redis::{AsyncCommands, Client};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::warn;

use super::{CacheStats, ResponseCache};
use crate::liquidplanner::LpError;

/// Log a backend failure; callers carry on as if the cache missed.
fn backend_failure(operation: &'static str, target: &str, e: impl std::fmt::Display) {
    let err = LpError::cache(operation, e);
    warn!(key = %target, code = err.code(), error = %err, "Cache backend error");
}

/// Cache stored in Redis with `SETEX`, shared across server replicas.
pub struct RedisCache {
    conn: MultiplexedConnection,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RedisCache {
    /// Open a multiplexed connection and verify it with `PING`.
    pub async fn connect(redis_url: &str) -> Result<Self, LpError> {
        let connect_failed = |e| LpError::cache("connect", e);
        let client = Client::open(redis_url).map_err(connect_failed)?;
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(connect_failed)?;

        ::redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(connect_failed)?;

        Ok(Self {
            conn,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    fn conn(&self) -> MultiplexedConnection {
        self.conn.clone()
    }
}

#[async_trait]
impl ResponseCache for RedisCache {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Option<Value> {
        let mut conn = self.conn();
        let raw: Option<String> = match conn.get(key).await {
            Ok(v) => v,
            Err(e) => {
                backend_failure("get", key, e);
                None
            }
        };

        let value = raw.and_then(|json| match serde_json::from_str(&json) {
            Ok(v) => Some(v),
            Err(e) => {
                backend_failure("decode", key, e);
                None
            }
        });

        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    async fn set(&self, key: &str, value: &Value, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let mut conn = self.conn();
        let json = value.to_string();
        if let Err(e) = conn.set_ex::<_, _, ()>(key, json, ttl.as_secs().max(1)).await {
            backend_failure("set", key, e);
        }
    }

    async fn delete(&self, key: &str) {
        let mut conn = self.conn();
        if let Err(e) = conn.del::<_, ()>(key).await {
            backend_failure("delete", key, e);
        }
    }

    async fn invalidate_prefix(&self, prefix: &str) {
        let mut conn = self.conn();
        let pattern = format!("{}*", prefix);
        let keys: Vec<String> = match conn.keys(&pattern).await {
            Ok(k) => k,
            Err(e) => {
                backend_failure("invalidate", &pattern, e);
                return;
            }
        };

        if keys.is_empty() {
            return;
        }

        if let Err(e) = conn.del::<_, ()>(keys).await {
            backend_failure("invalidate", &pattern, e);
        }
    }

    async fn stats(&self) -> CacheStats {
        CacheStats::new(
            "redis",
            None,
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        let result = RedisCache::connect("not-a-redis-url").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    #[ignore = "Requires a running Redis at localhost:6379"]
    async fn test_roundtrip_against_local_redis() {
        let cache = RedisCache::connect("redis://localhost:6379").await.unwrap();
        let value = serde_json::json!({ "id": 7 });
        cache
            .set("lp:test:/tasks/7", &value, Duration::from_secs(30))
            .await;
        assert_eq!(cache.get("lp:test:/tasks/7").await, Some(value));

        cache.invalidate_prefix("lp:test:").await;
        assert!(cache.get("lp:test:/tasks/7").await.is_none());
    }
}
