// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loaded from environment variables.
///
/// All configuration is externalized to support 12-factor app deployment.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// API token sent as a bearer credential
    #[serde(default)]
    pub lp_api_token: Option<String>,

    /// Account email for basic auth (used when no token is set)
    #[serde(default)]
    pub lp_email: Option<String>,

    /// Account password for basic auth
    #[serde(default)]
    pub lp_password: Option<String>,

    /// Workspace that every scoped request targets
    pub lp_workspace_id: u64,

    /// API base URL (default: https://app.liquidplanner.com/api)
    #[serde(default = "default_base_url")]
    pub lp_base_url: String,

    /// Maximum upstream requests per rate-limit period (default: 60)
    #[serde(default = "default_rate_limit")]
    pub lp_rate_limit: u32,

    /// Rate-limit period in seconds (default: 60)
    #[serde(default = "default_rate_limit_period")]
    pub lp_rate_limit_period_secs: u64,

    /// Retries for transient upstream failures (default: 3)
    #[serde(default = "default_max_retries")]
    pub lp_max_retries: u32,

    /// Upstream request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub lp_request_timeout_secs: u64,

    /// Server host (default: 0.0.0.0)
    #[serde(default = "default_host")]
    pub mcp_host: String,

    /// Server port (default: 8000)
    #[serde(default = "default_port")]
    pub mcp_port: u16,

    /// Transport: "http" or "stdio" (default: http)
    #[serde(default)]
    pub mcp_transport: Transport,

    /// Log level (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "json" or "pretty" (default: json)
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Response caching enabled (default: false)
    #[serde(default)]
    pub cache_enabled: bool,

    /// Response cache TTL in seconds (default: 300)
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: u64,

    /// Redis URL; memory cache is used when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// TTL for custom field definitions in seconds (default: 3600)
    #[serde(default = "default_custom_fields_cache_ttl")]
    pub custom_fields_cache_ttl: u64,

    /// Batch size for bulk operations (default: 100)
    #[serde(default = "default_bulk_batch_size")]
    pub bulk_batch_size: usize,

    /// Concurrent upstream calls during bulk operations (default: 5)
    #[serde(default = "default_bulk_max_concurrent")]
    pub bulk_max_concurrent: usize,

    /// Deduplicate imported time entries by default (default: true)
    #[serde(default = "default_true")]
    pub time_entry_deduplication: bool,

    /// Task ids never imported (comma separated)
    #[serde(default)]
    pub time_entry_blacklisted_tasks: Vec<u64>,

    /// Users in deduplication precedence order (comma separated)
    #[serde(default)]
    pub time_entry_user_precedence: Vec<String>,

    /// Reject plain http base URLs (default: true)
    #[serde(default = "default_true")]
    pub require_https: bool,

    /// Upstream health probe interval in seconds (default: 30)
    #[serde(default = "default_health_check_interval")]
    pub health_check_interval_secs: u64,
}

/// How MCP messages reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Http,
    Stdio,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("invalid {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

fn default_base_url() -> String {
    "https://app.liquidplanner.com/api".to_string()
}

fn default_rate_limit() -> u32 {
    60
}

fn default_rate_limit_period() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_request_timeout() -> u64 {
    30
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_custom_fields_cache_ttl() -> u64 {
    3600
}

fn default_bulk_batch_size() -> usize {
    100
}

fn default_bulk_max_concurrent() -> usize {
    5
}

fn default_health_check_interval() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables are uppercase with underscore separators.
    /// Example: `LP_WORKSPACE_ID`, `MCP_PORT`, `LOG_LEVEL`, etc.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: Config = envy::from_env()?;
        config.validated()
    }

    /// Load configuration from explicit key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let config: Config =
            envy::from_iter(pairs.into_iter().map(|(k, v)| (k.into(), v.into())))?;
        config.validated()
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        let base = self.lp_base_url.trim_end_matches('/').to_string();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(invalid("LP_BASE_URL", "must start with http:// or https://"));
        }
        if self.require_https && !base.starts_with("https://") {
            return Err(invalid("LP_BASE_URL", "https is required (REQUIRE_HTTPS=true)"));
        }
        self.lp_base_url = base;

        let has_token = self.lp_api_token.as_deref().is_some_and(|t| !t.is_empty());
        let has_basic = self.lp_email.is_some() && self.lp_password.is_some();
        if !has_token && !has_basic {
            return Err(invalid(
                "LP_API_TOKEN",
                "set LP_API_TOKEN or both LP_EMAIL and LP_PASSWORD",
            ));
        }

        if self.lp_workspace_id == 0 {
            return Err(invalid("LP_WORKSPACE_ID", "must be a positive id"));
        }

        check_range("LP_RATE_LIMIT", self.lp_rate_limit as u64, 1, 1000)?;
        check_range("LP_RATE_LIMIT_PERIOD_SECS", self.lp_rate_limit_period_secs, 1, 3600)?;
        check_range("LP_MAX_RETRIES", self.lp_max_retries as u64, 0, 10)?;
        check_range("LP_REQUEST_TIMEOUT_SECS", self.lp_request_timeout_secs, 1, 300)?;
        check_range("CACHE_TTL", self.cache_ttl, 0, 86_400)?;
        check_range("CUSTOM_FIELDS_CACHE_TTL", self.custom_fields_cache_ttl, 60, 86_400)?;
        check_range("BULK_BATCH_SIZE", self.bulk_batch_size as u64, 1, 1000)?;
        check_range("BULK_MAX_CONCURRENT", self.bulk_max_concurrent as u64, 1, 20)?;
        check_range("HEALTH_CHECK_INTERVAL_SECS", self.health_check_interval_secs, 1, 3600)?;

        if let Some(url) = &self.redis_url {
            if !(url.starts_with("redis://") || url.starts_with("rediss://")) {
                return Err(invalid("REDIS_URL", "must start with redis:// or rediss://"));
            }
        }

        self.log_level = self.log_level.to_lowercase();
        if self.log_level == "warning" {
            self.log_level = "warn".to_string();
        }
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(invalid(
                "LOG_LEVEL",
                format!("must be one of {:?}", LOG_LEVELS),
            ));
        }

        self.log_format = self.log_format.to_lowercase();
        if self.log_format != "json" && self.log_format != "pretty" {
            return Err(invalid("LOG_FORMAT", "must be json or pretty"));
        }

        Ok(self)
    }

    /// Configuration as JSON with secrets masked, for startup logging.
    pub fn redacted(&self) -> serde_json::Value {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "***MASKED***");
        serde_json::json!({
            "lp_api_token": mask(&self.lp_api_token),
            "lp_email": self.lp_email,
            "lp_password": mask(&self.lp_password),
            "lp_workspace_id": self.lp_workspace_id,
            "lp_base_url": self.lp_base_url,
            "lp_rate_limit": self.lp_rate_limit,
            "lp_rate_limit_period_secs": self.lp_rate_limit_period_secs,
            "lp_max_retries": self.lp_max_retries,
            "mcp_host": self.mcp_host,
            "mcp_port": self.mcp_port,
            "mcp_transport": self.mcp_transport,
            "cache_enabled": self.cache_enabled,
            "cache_ttl": self.cache_ttl,
            "redis_url": self.redis_url.as_ref().map(|_| "***MASKED***"),
            "bulk_batch_size": self.bulk_batch_size,
            "bulk_max_concurrent": self.bulk_max_concurrent,
        })
    }
}

fn invalid(key: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        message: message.into(),
    }
}

fn check_range(key: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(invalid(
            key,
            format!("{} is outside {}..={}", value, min, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![("LP_API_TOKEN", "secret"), ("LP_WORKSPACE_ID", "42")]
    }

    #[test]
    fn test_default_config() {
        let config = Config::from_pairs(base()).expect("Failed to load config");

        assert_eq!(config.mcp_host, "0.0.0.0");
        assert_eq!(config.mcp_port, 8000);
        assert_eq!(config.lp_base_url, "https://app.liquidplanner.com/api");
        assert_eq!(config.lp_rate_limit, 60);
        assert_eq!(config.mcp_transport, Transport::Http);
        assert!(!config.cache_enabled);
        assert!(config.time_entry_deduplication);
        assert!(config.time_entry_blacklisted_tasks.is_empty());
    }

    #[test]
    fn test_comma_separated_lists() {
        let mut pairs = base();
        pairs.push(("TIME_ENTRY_BLACKLISTED_TASKS", "10,20,30"));
        pairs.push(("TIME_ENTRY_USER_PRECEDENCE", "alice,bob"));
        let config = Config::from_pairs(pairs).unwrap();

        assert_eq!(config.time_entry_blacklisted_tasks, vec![10, 20, 30]);
        assert_eq!(config.time_entry_user_precedence, vec!["alice", "bob"]);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let mut pairs = base();
        pairs.push(("LP_BASE_URL", "https://lp.example.com/api/"));
        let config = Config::from_pairs(pairs).unwrap();
        assert_eq!(config.lp_base_url, "https://lp.example.com/api");
    }

    #[test]
    fn test_http_rejected_when_https_required() {
        let mut pairs = base();
        pairs.push(("LP_BASE_URL", "http://localhost:9000"));
        let err = Config::from_pairs(pairs).unwrap_err();
        assert!(err.to_string().contains("LP_BASE_URL"));

        let mut pairs = base();
        pairs.push(("LP_BASE_URL", "http://localhost:9000"));
        pairs.push(("REQUIRE_HTTPS", "false"));
        assert!(Config::from_pairs(pairs).is_ok());
    }

    #[test]
    fn test_credentials_required() {
        let err = Config::from_pairs(vec![("LP_WORKSPACE_ID", "42")]).unwrap_err();
        assert!(err.to_string().contains("LP_API_TOKEN"));

        let config = Config::from_pairs(vec![
            ("LP_WORKSPACE_ID", "42"),
            ("LP_EMAIL", "me@example.com"),
            ("LP_PASSWORD", "pw"),
        ]);
        assert!(config.is_ok());
    }

    #[test]
    fn test_range_validation() {
        let mut pairs = base();
        pairs.push(("LP_RATE_LIMIT", "5000"));
        let err = Config::from_pairs(pairs).unwrap_err();
        assert!(err.to_string().contains("LP_RATE_LIMIT"));
    }

    #[test]
    fn test_redis_url_scheme() {
        let mut pairs = base();
        pairs.push(("REDIS_URL", "http://cache:6379"));
        assert!(Config::from_pairs(pairs).is_err());
    }

    #[test]
    fn test_log_level_normalized() {
        let mut pairs = base();
        pairs.push(("LOG_LEVEL", "WARNING"));
        let config = Config::from_pairs(pairs).unwrap();
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_redacted_masks_secrets() {
        let config = Config::from_pairs(base()).unwrap();
        let redacted = config.redacted().to_string();
        assert!(!redacted.contains("secret"));
        assert!(redacted.contains("***MASKED***"));
    }
}
