// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! LiquidPlanner API Client
//!
//! HTTP client for the LiquidPlanner REST API.
//!
//! Every request goes through the same pipeline:
//! - wait for a rate-limit slot
//! - send with bearer or basic credentials
//! - map non-success statuses onto `LpError`
//! - retry transient failures with exponential backoff
//!
//! GET responses are cached when a cache backend is configured; successful
//! writes invalidate the cached entries of the resource they touched.

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::error::LpError;
use super::models::{
    Account, CreateProjectRequest, CreateTaskRequest, CreateTimeEntryRequest, CustomField,
    ItemType, Member, Project, Task, TimeEntry, UpdateTaskRequest,
};
use crate::cache::ResponseCache;
use crate::config::Config;
use crate::metrics::Metrics;
use crate::rate_limit::{RateLimitConfig, RateLimiter};

const USER_AGENT: &str = concat!("liquidplanner-mcp/", env!("CARGO_PKG_VERSION"));
const BASE_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 30_000;

/// Upstream query parameters.
pub type Query = [(String, String)];

// =============================================================================
// Credentials
// =============================================================================

#[derive(Clone)]
enum Credentials {
    Bearer(String),
    Basic { email: String, password: String },
}

impl Credentials {
    fn from_config(config: &Config) -> Result<Self, LpError> {
        if let Some(token) = config.lp_api_token.as_ref().filter(|t| !t.is_empty()) {
            return Ok(Credentials::Bearer(token.clone()));
        }
        match (&config.lp_email, &config.lp_password) {
            (Some(email), Some(password)) => Ok(Credentials::Basic {
                email: email.clone(),
                password: password.clone(),
            }),
            _ => Err(LpError::Config {
                key: "LP_API_TOKEN".to_string(),
                message: "no credentials configured".to_string(),
            }),
        }
    }

    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Credentials::Bearer(token) => request.bearer_auth(token),
            Credentials::Basic { email, password } => request.basic_auth(email, Some(password)),
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// Client for a single LiquidPlanner workspace.
pub struct LiquidPlannerClient {
    http: Client,
    base_url: String,
    workspace_id: u64,
    credentials: Credentials,
    rate_limiter: RateLimiter,
    cache: Arc<dyn ResponseCache>,
    cache_ttl: Duration,
    custom_fields_ttl: Duration,
    max_retries: u32,
    timeout_secs: u64,
    metrics: Metrics,
}

impl LiquidPlannerClient {
    /// Create a client from configuration.
    pub fn new(
        config: &Config,
        cache: Arc<dyn ResponseCache>,
        metrics: Metrics,
    ) -> Result<Self, LpError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.lp_request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LpError::Config {
                key: "LP_BASE_URL".to_string(),
                message: format!("failed to build HTTP client: {}", e),
            })?;

        let rate_limiter = RateLimiter::with_config(RateLimitConfig {
            requests_per_period: config.lp_rate_limit,
            period_seconds: config.lp_rate_limit_period_secs,
        });

        info!(
            base_url = %config.lp_base_url,
            workspace_id = config.lp_workspace_id,
            rate_limit = config.lp_rate_limit,
            cache = cache.backend(),
            "LiquidPlanner client initialized"
        );

        Ok(Self {
            http,
            base_url: config.lp_base_url.clone(),
            workspace_id: config.lp_workspace_id,
            credentials: Credentials::from_config(config)?,
            rate_limiter,
            cache,
            cache_ttl: Duration::from_secs(config.cache_ttl),
            custom_fields_ttl: Duration::from_secs(config.custom_fields_cache_ttl),
            max_retries: config.lp_max_retries,
            timeout_secs: config.lp_request_timeout_secs,
            metrics,
        })
    }

    pub fn workspace_id(&self) -> u64 {
        self.workspace_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &Arc<dyn ResponseCache> {
        &self.cache
    }

    /// Configured limit plus the current window, without consuming a slot.
    pub fn rate_limit_status(&self) -> Value {
        let config = self.rate_limiter.config();
        let window = self.rate_limiter.peek();
        json!({
            "requests_per_period": config.requests_per_period,
            "period_seconds": config.period_seconds,
            "current": window.current,
            "reset_at": window.reset_at,
        })
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    // ===== Paths and cache keys =====

    /// Prefix workspace-scoped paths with `/workspaces/{id}`.
    fn full_path(&self, path: &str) -> String {
        if path == "/account" || path.starts_with("/workspaces/") {
            path.to_string()
        } else {
            format!("/workspaces/{}{}", self.workspace_id, path)
        }
    }

    fn cache_key(&self, full_path: &str, query: &Query) -> String {
        let mut pairs: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        pairs.sort();
        format!("lp:{}:{}?{}", self.workspace_id, full_path, pairs.join("&"))
    }

    /// Cache prefixes touched by a write to `path`.
    fn invalidation_prefixes(&self, path: &str) -> Vec<String> {
        let resource = path
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or_default();
        let scope = format!("lp:{}:/workspaces/{}", self.workspace_id, self.workspace_id);

        let mut prefixes = vec![format!("{}/{}", scope, resource)];
        if path.ends_with("/track_time") {
            prefixes.push(format!("{}/timesheet_entries", scope));
        }
        prefixes
    }

    // ===== Request pipeline =====

    /// GET a workspace-scoped path, served from cache when possible.
    pub async fn get(&self, path: &str, query: &Query) -> Result<Value, LpError> {
        self.get_with_ttl(path, query, self.cache_ttl).await
    }

    async fn get_with_ttl(
        &self,
        path: &str,
        query: &Query,
        ttl: Duration,
    ) -> Result<Value, LpError> {
        let full_path = self.full_path(path);
        let key = self.cache_key(&full_path, query);

        if let Some(cached) = self.cache.get(&key).await {
            debug!(key = %key, "Cache hit");
            self.metrics.record_cache_hit();
            return Ok(cached);
        }
        self.metrics.record_cache_miss();

        let value = self.send(Method::GET, &full_path, query, None).await?;
        self.cache.set(&key, &value, ttl).await;
        Ok(value)
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, LpError> {
        self.write(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, LpError> {
        self.write(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, LpError> {
        self.write(Method::DELETE, path, None).await
    }

    async fn write(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, LpError> {
        let full_path = self.full_path(path);
        let value = self.send(method, &full_path, &[], body).await?;
        for prefix in self.invalidation_prefixes(path) {
            self.cache.invalidate_prefix(&prefix).await;
        }
        Ok(value)
    }

    /// Send with retries. Only retryable errors are retried.
    async fn send(
        &self,
        method: Method,
        full_path: &str,
        query: &Query,
        body: Option<&Value>,
    ) -> Result<Value, LpError> {
        let mut attempt: u32 = 0;
        loop {
            match self.send_once(method.clone(), full_path, query, body).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = backoff_delay(attempt, &e);
                    warn!(
                        method = %method,
                        path = %full_path,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying LiquidPlanner request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(
        &self,
        method: Method,
        full_path: &str,
        query: &Query,
        body: Option<&Value>,
    ) -> Result<Value, LpError> {
        let waits = self.rate_limiter.acquire().await;
        if waits > 0 {
            self.metrics.record_rate_limit_waits(waits);
        }

        let url = format!("{}{}", self.base_url, full_path);
        let mut request = self
            .credentials
            .apply(self.http.request(method.clone(), &url))
            .header("Accept", "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let started = Instant::now();
        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                self.metrics.record_upstream_request(method.as_str(), 0);
                return Err(self.map_transport_error(e));
            }
        };

        let status = response.status();
        self.metrics
            .record_upstream_request(method.as_str(), status.as_u16());
        debug!(
            method = %method,
            path = %full_path,
            status = status.as_u16(),
            duration_ms = started.elapsed().as_millis() as u64,
            "LiquidPlanner response"
        );

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if status.is_success() {
            if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(|e| LpError::Decode(e.to_string()));
        }

        let body = serde_json::from_str(&text).unwrap_or_else(|_| {
            if text.trim().is_empty() {
                Value::Null
            } else {
                json!({ "message": text.trim() })
            }
        });
        Err(LpError::from_response(status.as_u16(), &body, retry_after))
    }

    fn map_transport_error(&self, e: reqwest::Error) -> LpError {
        match LpError::from(e) {
            LpError::Timeout { .. } => LpError::Timeout {
                seconds: self.timeout_secs,
            },
            other => other,
        }
    }

    // =========================================================================
    // Resources
    // =========================================================================

    /// The account behind the configured credentials.
    pub async fn get_account(&self) -> Result<Account, LpError> {
        let value = self.send(Method::GET, "/account", &[], None).await?;
        decode(value)
    }

    /// Startup credential check against `/account`.
    ///
    /// Rejected credentials are an error. Any other failure is logged and
    /// yields `None`: the health checker reports the outage from then on.
    pub async fn verify_credentials(&self) -> Result<Option<Account>, LpError> {
        match self.get_account().await {
            Ok(account) => {
                info!(
                    user = account.user_name.as_deref().unwrap_or("Unknown"),
                    workspace_id = self.workspace_id,
                    "Authenticated with LiquidPlanner"
                );
                Ok(Some(account))
            }
            Err(e @ LpError::Auth { .. }) => Err(e),
            Err(e) => {
                warn!(error = %e, "LiquidPlanner unreachable at startup, continuing");
                Ok(None)
            }
        }
    }

    pub async fn list_members(&self) -> Result<Vec<Member>, LpError> {
        decode(self.get("/members", &[]).await?)
    }

    // ===== Tasks =====

    pub async fn list_tasks(&self, query: &Query) -> Result<Vec<Task>, LpError> {
        decode(self.get("/tasks", query).await?)
    }

    pub async fn get_task(&self, task_id: u64) -> Result<Task, LpError> {
        let value = self
            .get(&format!("/tasks/{}", task_id), &[])
            .await
            .map_err(|e| with_resource(e, format!("task {}", task_id)))?;
        decode(value)
    }

    pub async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task, LpError> {
        decode(self.post("/tasks", &json!({ "task": request })).await?)
    }

    pub async fn update_task(
        &self,
        task_id: u64,
        request: &UpdateTaskRequest,
    ) -> Result<Task, LpError> {
        let value = self
            .put(&format!("/tasks/{}", task_id), &json!({ "task": request }))
            .await
            .map_err(|e| with_resource(e, format!("task {}", task_id)))?;
        decode(value)
    }

    // ===== Projects =====

    pub async fn list_projects(&self, query: &Query) -> Result<Vec<Project>, LpError> {
        decode(self.get("/projects", query).await?)
    }

    pub async fn get_project(&self, project_id: u64) -> Result<Project, LpError> {
        let value = self
            .get(&format!("/projects/{}", project_id), &[])
            .await
            .map_err(|e| with_resource(e, format!("project {}", project_id)))?;
        decode(value)
    }

    pub async fn create_project(&self, request: &CreateProjectRequest) -> Result<Project, LpError> {
        decode(self.post("/projects", &json!({ "project": request })).await?)
    }

    // ===== Generic tree items =====

    pub async fn get_item(&self, item_type: ItemType, item_id: u64) -> Result<Value, LpError> {
        self.get(&format!("/{}/{}", item_type.collection(), item_id), &[])
            .await
            .map_err(|e| with_resource(e, format!("{} {}", item_type, item_id)))
    }

    pub async fn update_item(
        &self,
        item_type: ItemType,
        item_id: u64,
        fields: Value,
    ) -> Result<Value, LpError> {
        let mut body = serde_json::Map::new();
        body.insert(item_type.body_key().to_string(), fields);
        self.put(
            &format!("/{}/{}", item_type.collection(), item_id),
            &Value::Object(body),
        )
        .await
        .map_err(|e| with_resource(e, format!("{} {}", item_type, item_id)))
    }

    // ===== Custom fields =====

    /// Custom field definitions, cached with the longer definition TTL.
    pub async fn list_custom_fields(&self) -> Result<Vec<CustomField>, LpError> {
        decode(
            self.get_with_ttl("/custom_fields", &[], self.custom_fields_ttl)
                .await?,
        )
    }

    // ===== Time tracking =====

    pub async fn list_timesheet_entries(&self, query: &Query) -> Result<Vec<TimeEntry>, LpError> {
        decode(self.get("/timesheet_entries", query).await?)
    }

    /// Log time against a task.
    pub async fn track_time(&self, request: &CreateTimeEntryRequest) -> Result<Value, LpError> {
        self.post(
            &format!("/tasks/{}/track_time", request.task_id),
            &request.to_track_time_body(),
        )
        .await
        .map_err(|e| match e {
            LpError::Validation { message, .. } => LpError::TimeEntry {
                task_id: request.task_id,
                message,
            },
            other => with_resource(other, format!("task {}", request.task_id)),
        })
    }
}

/// Delay before retry `attempt` (0-based). A server `Retry-After` wins.
pub(crate) fn backoff_delay(attempt: u32, error: &LpError) -> Duration {
    if let LpError::RateLimited {
        retry_after: Some(secs),
        ..
    } = error
    {
        return Duration::from_secs(*secs).min(Duration::from_millis(MAX_BACKOFF_MS));
    }
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, LpError> {
    serde_json::from_value(value).map_err(|e| LpError::Decode(e.to_string()))
}

fn with_resource(error: LpError, resource: String) -> LpError {
    match error {
        LpError::NotFound { .. } => LpError::not_found(resource),
        other => other,
    }
}

// =============================================================================
// Tests
// =============================================================================
