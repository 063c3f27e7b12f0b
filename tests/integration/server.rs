// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use axum::http::{Method, StatusCode};
use serde_json::json;
use std::sync::atomic::Ordering;

use crate::harness::{TestServer, WORKSPACE_ID};

#[tokio::test]
async fn test_health_endpoints_report_upstream() {
    let server = TestServer::start().await;

    let (status, body) = server.request(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["liquidplanner_status"], "connected");

    let (status, _) = server.request(Method::GET, "/health/live", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server.request(Method::GET, "/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liquidplanner_status"], "connected");
}

#[tokio::test]
async fn test_health_check_tool() {
    let server = TestServer::with_env(&[("LP_MAX_RETRIES", "0")]).await;

    let (status, is_error, payload) = server.call_tool("health_check", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!is_error);
    assert_eq!(payload["status"], "healthy");
    assert_eq!(payload["liquidplanner_api"], "connected");
    assert_eq!(payload["account"], "alice");
    assert_eq!(payload["workspace_id"], WORKSPACE_ID);

    server.upstream.account_down.store(true, Ordering::SeqCst);
    let (status, is_error, payload) = server.call_tool("health_check", json!({})).await;
    // an unhealthy upstream is still a successful tool call
    assert_eq!(status, StatusCode::OK);
    assert!(!is_error);
    assert_eq!(payload["status"], "unhealthy");
    assert_eq!(payload["liquidplanner_api"], "disconnected");
}

#[tokio::test]
async fn test_metrics_after_tool_calls() {
    let server = TestServer::start().await;
    server.call_tool("list_projects", json!({})).await;

    let (status, body) = server.request(Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap();
    assert!(text.contains("mcp_tool_calls_total"));
    assert!(text.contains("list_projects"));
    assert!(text.contains("liquidplanner_requests_total"));
    assert!(text.contains("liquidplanner_upstream_up 1"));
}

#[tokio::test]
async fn test_mcp_session() {
    let server = TestServer::start().await;

    let (status, reply) = server
        .rpc(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": { "name": "integration", "version": "0.0.0" }
            }
        }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["result"]["serverInfo"]["name"], "liquidplanner-mcp");
    assert!(reply["result"]["capabilities"]["tools"].is_object());

    let (status, _) = server
        .rpc(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (_, reply) = server
        .rpc(json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }))
        .await;
    assert_eq!(reply["result"]["tools"].as_array().unwrap().len(), 17);

    let (_, reply) = server
        .rpc(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": { "name": "list_projects", "arguments": {} }
        }))
        .await;
    assert_eq!(reply["id"], 3);
    assert_eq!(reply["result"]["isError"], false);
    let text = reply["result"]["content"][0]["text"].as_str().unwrap();
    let payload: serde_json::Value = serde_json::from_str(text).unwrap();
    assert_eq!(payload["total_count"], 2);

    let (_, reply) = server
        .rpc(json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": { "name": "delete_everything", "arguments": {} }
        }))
        .await;
    assert_eq!(reply["error"]["code"], -32602);
}

#[tokio::test]
async fn test_rest_tools_list_and_unknown_tool() {
    let server = TestServer::start().await;

    let (status, body) = server
        .request(Method::POST, "/mcp/tools/list", Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tools"][0]["name"], "bulk_import_time_entries");

    let (status, body) = server
        .request(
            Method::POST,
            "/mcp/tools/call",
            Some(json!({ "name": "delete_everything", "arguments": {} })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["isError"], true);
}
