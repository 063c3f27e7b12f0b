// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use axum::http::StatusCode;
use serde_json::json;

use crate::harness::TestServer;

const IMPORT_CSV: &str = "\
task_id,work,work_date,person,note
1,2.0,2024-05-01,alice,already logged
3,1.5,2024-05-02,bob,bob copy
3,1.5,2024-05-02,alice,alice copy
99,1.0,2024-05-02,bob,blacklisted
2,abc,2024-05-02,bob,bad hours
3,1.0,2024-05-03,carol,unknown person
";

#[tokio::test]
async fn test_create_time_entry_logs_work() {
    let server = TestServer::start().await;

    let (status, is_error, payload) = server
        .call_tool(
            "create_time_entry",
            json!({ "task_id": 3, "work": 1.25, "work_date": "2024-05-06", "note": "deploy" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(!is_error);
    assert_eq!(payload["success"], true);
    assert_eq!(payload["time_entry"]["item_id"], 3);
    assert_eq!(server.upstream.entry_count(), 2);
}

#[tokio::test]
async fn test_create_time_entry_rejects_future_date() {
    let server = TestServer::start().await;

    let (status, is_error, payload) = server
        .call_tool(
            "create_time_entry",
            json!({ "task_id": 3, "work": 1.0, "work_date": "2999-01-01" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(is_error);
    assert_eq!(payload["error"], "LIQUIDPLANNER_TIME_ENTRY_ERROR");
    assert_eq!(server.upstream.entry_count(), 1);
}

#[tokio::test]
async fn test_list_time_entries_totals() {
    let server = TestServer::start().await;

    let (_, is_error, payload) = server.call_tool("list_time_entries", json!({})).await;

    assert!(!is_error);
    assert_eq!(payload["total_count"], 1);
    assert_eq!(payload["total_hours"], 2.0);
}

#[tokio::test]
async fn test_bulk_import_dedups_blacklists_and_reports_rows() {
    let server = TestServer::start().await;

    let (status, is_error, payload) = server
        .call_tool("bulk_import_time_entries", json!({ "csv_data": IMPORT_CSV }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(!is_error, "{}", payload);
    assert_eq!(payload["total_rows"], 6);

    // alice outranks bob for the same task/day/hours
    let imported = payload["imported_items"].as_array().unwrap();
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0]["line"], 4);
    assert_eq!(payload["successful_rows"], 1);

    let error_lines: Vec<u64> = payload["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["line"].as_u64().unwrap())
        .collect();
    assert_eq!(error_lines, vec![6, 7]);
    assert_eq!(payload["failed_rows"], 2);

    assert_eq!(payload["skipped_items"][0]["task_id"], 99);
    assert_eq!(payload["skipped_items"][0]["reason"], "blacklisted_task");

    let dedup = &payload["deduplication"];
    assert_eq!(dedup["duplicates_found"], 2);
    assert_eq!(dedup["duplicates_skipped"], 2);
    let resolutions: Vec<&str> = dedup["duplicate_entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["resolution"].as_str().unwrap())
        .collect();
    assert!(resolutions.contains(&"skipped"));
    assert!(resolutions.contains(&"already_exists"));

    assert_eq!(server.upstream.entry_count(), 2);
}

#[tokio::test]
async fn test_bulk_import_validation_only_writes_nothing() {
    let server = TestServer::start().await;

    let (_, is_error, payload) = server
        .call_tool(
            "bulk_import_time_entries",
            json!({ "csv_data": IMPORT_CSV, "validation_only": true }),
        )
        .await;

    assert!(!is_error);
    assert_eq!(payload["validation_only"], true);
    assert_eq!(payload["successful_rows"], 1);
    assert_eq!(payload["imported_items"], json!([]));
    assert_eq!(server.upstream.entry_count(), 1);
}

#[tokio::test]
async fn test_bulk_import_without_columns_is_csv_error() {
    let server = TestServer::start().await;

    let (status, is_error, payload) = server
        .call_tool("bulk_import_time_entries", json!({ "csv_data": "foo,bar\n1,2\n" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(is_error);
    assert_eq!(payload["error"], "LIQUIDPLANNER_CSV_ERROR");
}

#[tokio::test]
async fn test_timesheet_report_csv() {
    let server = TestServer::start().await;

    let (_, is_error, payload) = server
        .call_tool(
            "generate_timesheet_report",
            json!({ "start_date": "2024-05-01", "end_date": "2024-05-31", "format": "csv" }),
        )
        .await;

    assert!(!is_error, "{}", payload);
    assert_eq!(payload["summary"]["total_hours"], 2.0);
    let csv = payload["csv_data"].as_str().unwrap();
    assert!(csv.lines().count() >= 2);
    assert!(csv.contains("2024-05-01"));
}
