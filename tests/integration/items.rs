// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use axum::http::StatusCode;
use serde_json::json;
use std::sync::atomic::Ordering;

use crate::harness::TestServer;

#[tokio::test]
async fn test_list_tasks_hides_done_by_default() {
    let server = TestServer::start().await;

    let (_, is_error, payload) = server.call_tool("list_tasks", json!({})).await;
    assert!(!is_error);
    assert_eq!(payload["total_count"], 3);

    let (_, _, payload) = server
        .call_tool("list_tasks", json!({ "filters": { "include_done": true } }))
        .await;
    assert_eq!(payload["total_count"], 4);

    let (_, _, payload) = server
        .call_tool("list_tasks", json!({ "filters": { "name_contains": "design" } }))
        .await;
    assert_eq!(payload["tasks"][0]["id"], 1);
}

#[tokio::test]
async fn test_get_task_not_found() {
    let server = TestServer::start().await;

    let (status, is_error, payload) = server.call_tool("get_task", json!({ "task_id": 404 })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(is_error);
    assert_eq!(payload["error"], "LIQUIDPLANNER_NOT_FOUND_ERROR");
    assert!(payload["message"].as_str().unwrap().contains("task 404"));
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = TestServer::with_env(&[("LP_MAX_RETRIES", "2")]).await;
    server.upstream.flaky_failures.store(1, Ordering::SeqCst);

    let (_, is_error, payload) = server.call_tool("get_task", json!({ "task_id": 7 })).await;

    assert!(!is_error, "{}", payload);
    assert_eq!(payload["name"], "Flaky");
    assert_eq!(server.upstream.flaky_failures.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_update_task_rejects_unknown_fields() {
    let server = TestServer::start().await;

    let (_, is_error, payload) = server
        .call_tool(
            "update_task",
            json!({ "task_id": 1, "updates": { "colour": "red" } }),
        )
        .await;

    assert!(is_error);
    assert_eq!(payload["error"], "LIQUIDPLANNER_VALIDATION_ERROR");
}

#[tokio::test]
async fn test_update_custom_fields_by_name_canonicalizes_picklist() {
    let server = TestServer::start().await;

    let (_, is_error, payload) = server
        .call_tool(
            "update_custom_fields",
            json!({ "item_id": 1, "item_type": "task", "custom_fields": { "phase": "build" } }),
        )
        .await;
    assert!(!is_error, "{}", payload);
    assert_eq!(payload["updated_fields"], json!(["Phase"]));

    let (_, _, values) = server
        .call_tool("get_custom_field_values", json!({ "item_id": 1, "item_type": "task" }))
        .await;
    assert_eq!(values["Phase"], "Build");
}

#[tokio::test]
async fn test_update_custom_fields_rejects_bad_picklist_value() {
    let server = TestServer::start().await;

    let (_, is_error, payload) = server
        .call_tool(
            "update_custom_fields",
            json!({ "item_id": 1, "item_type": "task", "custom_fields": { "Phase": "Someday" } }),
        )
        .await;

    assert!(is_error);
    assert_eq!(payload["error"], "LIQUIDPLANNER_CUSTOM_FIELD_ERROR");
}

#[tokio::test]
async fn test_bulk_update_applies_valid_items_and_reports_invalid() {
    let server = TestServer::start().await;

    let (_, is_error, payload) = server
        .call_tool(
            "bulk_update_tasks",
            json!({
                "updates": [
                    { "task_id": 1, "name": "Design API v2" },
                    { "task_id": 3, "bogus": true },
                    { "task_id": 404, "name": "ghost" }
                ]
            }),
        )
        .await;

    assert!(!is_error, "{}", payload);
    assert_eq!(payload["total_items"], 3);
    assert_eq!(payload["successful_items"], 1);
    assert_eq!(payload["failed_items"], 2);
    assert_eq!(payload["errors"][0]["index"], 1);
    assert_eq!(payload["errors"][1]["task_id"], 404);

    let (_, _, task) = server.call_tool("get_task", json!({ "task_id": 1 })).await;
    assert_eq!(task["name"], "Design API v2");
}

#[tokio::test]
async fn test_export_tasks_csv_has_custom_field_columns() {
    let server = TestServer::start().await;

    let (_, is_error, payload) = server
        .call_tool("export_data_to_csv", json!({ "data_type": "tasks" }))
        .await;

    assert!(!is_error, "{}", payload);
    assert_eq!(payload["data_type"], "tasks");
    assert_eq!(payload["total_records"], 3);
    let header = payload["csv_data"].as_str().unwrap().lines().next().unwrap().to_string();
    assert!(header.contains("cf:Phase"));
}

#[tokio::test]
async fn test_project_status_report() {
    let server = TestServer::start().await;

    let (_, is_error, payload) = server
        .call_tool(
            "generate_project_status_report",
            json!({ "project_ids": [100], "include_tasks": false }),
        )
        .await;

    assert!(!is_error, "{}", payload);
    let project = &payload["projects"][0];
    assert_eq!(project["name"], "Platform");
    assert_eq!(project["total_tasks"], 2);
    assert_eq!(project["completed_tasks"], 1);
    assert_eq!(project["percent_complete"], 50.0);
    assert_eq!(project["hours_logged"], 2.0);
}

#[tokio::test]
async fn test_cached_reads_are_invalidated_by_writes() {
    let server = TestServer::with_env(&[("CACHE_ENABLED", "true")]).await;

    server.call_tool("list_tasks", json!({})).await;
    server.call_tool("list_tasks", json!({})).await;
    assert_eq!(server.upstream.task_gets.load(Ordering::SeqCst), 1);

    let (_, is_error, _) = server
        .call_tool(
            "update_task",
            json!({ "task_id": 3, "updates": { "name": "Rotate all certs" } }),
        )
        .await;
    assert!(!is_error);

    let (_, _, payload) = server.call_tool("list_tasks", json!({})).await;
    assert_eq!(server.upstream.task_gets.load(Ordering::SeqCst), 2);
    let names: Vec<&str> = payload["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Rotate all certs"));
}
