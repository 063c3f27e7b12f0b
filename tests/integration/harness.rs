// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Test harness: an in-process LiquidPlanner stand-in plus the real MCP app.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Path, State},
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower::ServiceExt;

use liquidplanner_mcp::cache::build_cache;
use liquidplanner_mcp::config::Config;
use liquidplanner_mcp::handlers::{app_router, AppState};
use liquidplanner_mcp::health::HealthChecker;
use liquidplanner_mcp::liquidplanner::LiquidPlannerClient;
use liquidplanner_mcp::mcp::tools::{build_registry, ToolSettings};
use liquidplanner_mcp::metrics::Metrics;

pub const WORKSPACE_ID: u64 = 7;

// =============================================================================
// Upstream stand-in
// =============================================================================

/// State of the fake LiquidPlanner API.
pub struct Upstream {
    pub tasks: Mutex<Vec<Value>>,
    pub entries: Mutex<Vec<Value>>,
    pub task_gets: AtomicUsize,
    pub account_down: AtomicBool,
    /// Remaining 503 answers for `GET /tasks/7`
    pub flaky_failures: AtomicUsize,
}

impl Upstream {
    fn seeded() -> Self {
        Self {
            tasks: Mutex::new(vec![
                json!({
                    "id": 1, "name": "Design API", "project_id": 100, "parent_id": 100,
                    "is_done": false, "custom_field_values": { "Phase": "Plan" }
                }),
                json!({ "id": 2, "name": "Write docs", "project_id": 100, "is_done": true }),
                json!({ "id": 3, "name": "Rotate certs", "project_id": 200, "is_done": false }),
                json!({ "id": 7, "name": "Flaky", "project_id": 200, "is_done": false }),
            ]),
            entries: Mutex::new(vec![json!({
                "id": 500, "item_id": 1, "member_id": 10, "member_name": "alice",
                "work": 2.0, "work_performed_on": "2024-05-01", "note": "kickoff"
            })]),
            task_gets: AtomicUsize::new(0),
            account_down: AtomicBool::new(false),
            flaky_failures: AtomicUsize::new(0),
        }
    }

    pub fn entry_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

type Shared = Arc<Upstream>;

async fn account(State(up): State<Shared>) -> Response {
    if up.account_down.load(Ordering::SeqCst) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "message": "maintenance" })),
        )
            .into_response();
    }
    Json(json!({ "id": 10, "user_name": "alice", "email": "alice@example.com" })).into_response()
}

async fn members() -> Json<Value> {
    Json(json!([
        { "id": 10, "user_name": "alice", "email": "alice@example.com" },
        { "id": 11, "user_name": "bob", "first_name": "Bob", "last_name": "Stone" }
    ]))
}

async fn list_tasks(State(up): State<Shared>) -> Json<Value> {
    up.task_gets.fetch_add(1, Ordering::SeqCst);
    Json(Value::Array(up.tasks.lock().unwrap().clone()))
}

async fn get_task(State(up): State<Shared>, Path((_ws, id)): Path<(u64, u64)>) -> Response {
    if id == 7
        && up
            .flaky_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    {
        return (StatusCode::SERVICE_UNAVAILABLE, "try again").into_response();
    }
    let tasks = up.tasks.lock().unwrap();
    match tasks.iter().find(|t| t["id"] == id) {
        Some(task) => Json(task.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "no such task" }))).into_response(),
    }
}

async fn update_task(
    State(up): State<Shared>,
    Path((_ws, id)): Path<(u64, u64)>,
    Json(body): Json<Value>,
) -> Response {
    let mut tasks = up.tasks.lock().unwrap();
    let Some(task) = tasks.iter_mut().find(|t| t["id"] == id) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "no such task" }))).into_response();
    };
    if let (Some(target), Some(changes)) = (task.as_object_mut(), body["task"].as_object()) {
        for (k, v) in changes {
            target.insert(k.clone(), v.clone());
        }
    }
    Json(task.clone()).into_response()
}

async fn track_time(
    State(up): State<Shared>,
    Path((_ws, id)): Path<(u64, u64)>,
    Json(body): Json<Value>,
) -> Response {
    let mut entries = up.entries.lock().unwrap();
    let entry = json!({
        "id": 500 + entries.len() as u64,
        "item_id": id,
        "member_id": body["member_id"],
        "work": body["work"],
        "work_performed_on": body["work_performed_on"],
        "note": body["note"],
    });
    entries.push(entry.clone());
    (StatusCode::CREATED, Json(entry)).into_response()
}

async fn timesheet_entries(State(up): State<Shared>) -> Json<Value> {
    Json(Value::Array(up.entries.lock().unwrap().clone()))
}

async fn projects() -> Json<Value> {
    Json(json!([
        { "id": 100, "name": "Platform", "is_done": false },
        { "id": 200, "name": "Ops", "is_done": false }
    ]))
}

async fn get_project(Path((_ws, id)): Path<(u64, u64)>) -> Response {
    match id {
        100 => Json(json!({ "id": 100, "name": "Platform", "is_done": false })).into_response(),
        200 => Json(json!({ "id": 200, "name": "Ops", "is_done": false })).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn custom_fields() -> Json<Value> {
    Json(json!([
        {
            "id": 1, "name": "Phase", "type": "picklist", "item_type": "Task",
            "picklist_values": ["Plan", "Build", "Ship"]
        },
        { "id": 2, "name": "Budget", "type": "number", "item_type": "Project" }
    ]))
}

fn upstream_router(state: Shared) -> Router {
    Router::new()
        .route("/api/account", get(account))
        .route("/api/workspaces/:ws/members", get(members))
        .route("/api/workspaces/:ws/tasks", get(list_tasks))
        .route("/api/workspaces/:ws/tasks/:id", get(get_task).put(update_task))
        .route("/api/workspaces/:ws/tasks/:id/track_time", post(track_time))
        .route("/api/workspaces/:ws/timesheet_entries", get(timesheet_entries))
        .route("/api/workspaces/:ws/projects", get(projects))
        .route("/api/workspaces/:ws/projects/:id", get(get_project))
        .route("/api/workspaces/:ws/custom_fields", get(custom_fields))
        .with_state(state)
}

async fn spawn_upstream() -> (String, Shared) {
    let state = Arc::new(Upstream::seeded());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = upstream_router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/api", addr), state)
}

// =============================================================================
// Server under test
// =============================================================================

pub struct TestServer {
    pub app: Router,
    pub upstream: Shared,
    pub client: Arc<LiquidPlannerClient>,
    pub metrics: Metrics,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::with_env(&[]).await
    }

    /// Start with extra environment pairs layered over the defaults.
    pub async fn with_env(extra: &[(&str, &str)]) -> Self {
        let (base_url, upstream) = spawn_upstream().await;
        let workspace = WORKSPACE_ID.to_string();
        let mut pairs: Vec<(String, String)> = vec![
            ("LP_API_TOKEN".into(), "test-token".into()),
            ("LP_WORKSPACE_ID".into(), workspace),
            ("LP_BASE_URL".into(), base_url),
            ("REQUIRE_HTTPS".into(), "false".into()),
            ("TIME_ENTRY_USER_PRECEDENCE".into(), "alice,bob".into()),
            ("TIME_ENTRY_BLACKLISTED_TASKS".into(), "99".into()),
        ];
        pairs.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let config = Config::from_pairs(pairs).unwrap();
        let metrics = Metrics::new();
        let cache = build_cache(&config).await;
        let client =
            Arc::new(LiquidPlannerClient::new(&config, cache, metrics.clone()).unwrap());
        let registry = Arc::new(build_registry(
            client.clone(),
            ToolSettings::from_config(&config),
            metrics.clone(),
        ));

        let checker = HealthChecker::new(client.clone(), std::time::Duration::from_secs(60));
        checker.check_once().await;
        let app = app_router(registry, AppState::new(checker.state()), metrics.clone());

        Self {
            app,
            upstream,
            client,
            metrics,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = self.send(method, uri, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    /// POST one JSON-RPC message to `/mcp`. Replies arrive as an event
    /// stream; the last JSON-RPC `data:` frame is returned.
    pub async fn rpc(&self, message: Value) -> (StatusCode, Value) {
        let (status, bytes) = self.send(Method::POST, "/mcp", Some(message)).await;
        let reply = String::from_utf8_lossy(&bytes)
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .filter_map(|data| serde_json::from_str::<Value>(data.trim()).ok())
            .filter(|frame| frame.get("jsonrpc").is_some())
            .last()
            .unwrap_or(Value::Null);
        (status, reply)
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Bytes) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("host", "localhost")
            .header("content-type", "application/json")
            .header("accept", "application/json, text/event-stream");
        let body = match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        };
        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes)
    }

    /// Call a tool over `/mcp/tools/call`, returning the status, the
    /// `isError` flag and the decoded JSON text payload.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> (StatusCode, bool, Value) {
        let (status, body) = self
            .request(
                Method::POST,
                "/mcp/tools/call",
                Some(json!({ "name": name, "arguments": arguments })),
            )
            .await;
        let is_error = body["isError"].as_bool().unwrap_or(false);
        let text = body["content"][0]["text"].as_str().unwrap_or_default();
        let payload =
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
        (status, is_error, payload)
    }
}
