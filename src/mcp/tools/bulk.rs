// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Bulk operation tools: batched task updates and CSV export.

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::args::{self, Args};
use super::custom_fields::{definitions_for, resolve_custom_fields};
use super::registry::{Tool, ToolContext};
use super::ToolSettings;
use crate::export::{self, DataType};
use crate::liquidplanner::models::{Filters, ItemType, UpdateTaskRequest};
use crate::liquidplanner::{LiquidPlannerClient, LpError};
use crate::mcp::protocol::ToolCallResponse;

/// Upper bound on items in one bulk request.
pub const MAX_BULK_ITEMS: usize = 1000;

// =============================================================================
// Batching
// =============================================================================

/// Run `f` over `items` in batches of `batch_size`, with at most
/// `max_concurrent` calls in flight. Results keep input order.
pub(crate) async fn run_in_batches<T, R, F, Fut>(
    items: Vec<T>,
    batch_size: usize,
    max_concurrent: usize,
    f: F,
) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    let total = items.len();
    let mut results = Vec::with_capacity(total);
    let mut items = items.into_iter().peekable();
    let mut batch_no = 0usize;

    while items.peek().is_some() {
        let batch: Vec<T> = items.by_ref().take(batch_size.max(1)).collect();
        batch_no += 1;
        debug!(batch = batch_no, size = batch.len(), total, "Processing batch");

        let out: Vec<R> = stream::iter(batch)
            .map(&f)
            .buffered(max_concurrent.max(1))
            .collect()
            .await;
        results.extend(out);
    }
    results
}

// =============================================================================
// bulk_update_tasks
// =============================================================================

#[derive(Debug, Serialize)]
struct ItemError {
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_id: Option<u64>,
    error: &'static str,
    message: String,
}

impl ItemError {
    fn new(index: usize, task_id: Option<u64>, e: &LpError) -> Self {
        Self {
            index,
            task_id,
            error: e.code(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BulkOperationResult {
    operation_type: &'static str,
    total_items: usize,
    successful_items: usize,
    failed_items: usize,
    errors: Vec<ItemError>,
    results: Vec<Value>,
    execution_time: f64,
    validate_only: bool,
}

/// A validated update: (index in the request, task id, payload).
type PlannedUpdate = (usize, u64, UpdateTaskRequest);

pub struct BulkUpdateTasksTool {
    client: Arc<LiquidPlannerClient>,
    settings: ToolSettings,
}

impl BulkUpdateTasksTool {
    pub fn new(client: Arc<LiquidPlannerClient>, settings: ToolSettings) -> Self {
        Self { client, settings }
    }

    /// Validate every item; invalid ones are reported and left out.
    async fn plan(
        &self,
        items: &[Value],
        errors: &mut Vec<ItemError>,
    ) -> Result<Vec<PlannedUpdate>, LpError> {
        let mut planned = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let Some(obj) = item.as_object() else {
                errors.push(ItemError::new(
                    index,
                    None,
                    &LpError::validation("Each update must be an object"),
                ));
                continue;
            };

            let mut fields: Map<String, Value> = obj.clone();
            let task_id = match fields.remove("task_id").as_ref().and_then(Value::as_u64) {
                Some(id) if id > 0 => id,
                _ => {
                    errors.push(ItemError::new(
                        index,
                        None,
                        &LpError::invalid_field("task_id", "task_id must be a positive integer"),
                    ));
                    continue;
                }
            };

            match UpdateTaskRequest::from_updates(&fields) {
                Ok(request) => planned.push((index, task_id, request)),
                Err(e) => errors.push(ItemError::new(index, Some(task_id), &e)),
            }
        }

        let needs_fields = planned
            .iter()
            .any(|(_, _, r)| r.fields.contains_key("custom_field_values"));
        if !needs_fields {
            return Ok(planned);
        }

        let defs = definitions_for(&self.client, ItemType::Task).await?;
        let mut resolved = Vec::with_capacity(planned.len());
        for (index, task_id, mut request) in planned {
            if let Some(Value::Object(raw)) = request.fields.get("custom_field_values") {
                match resolve_custom_fields(&defs, raw) {
                    Ok(map) => {
                        request
                            .fields
                            .insert("custom_field_values".to_string(), Value::Object(map));
                    }
                    Err(e) => {
                        errors.push(ItemError::new(index, Some(task_id), &e));
                        continue;
                    }
                }
            }
            resolved.push((index, task_id, request));
        }
        Ok(resolved)
    }

    async fn run(&self, args: &Args) -> Result<BulkOperationResult, LpError> {
        let started = Instant::now();
        let items = args::optional_array(args, "updates")?.ok_or_else(|| {
            LpError::invalid_field("updates", "Missing required argument: updates")
        })?;
        if items.is_empty() || items.len() > MAX_BULK_ITEMS {
            return Err(LpError::invalid_field(
                "updates",
                format!("updates must contain 1..={} items", MAX_BULK_ITEMS),
            ));
        }
        let validate_only = args::optional_bool(args, "validate_only", false)?;

        let mut errors = Vec::new();
        let planned = self.plan(&items, &mut errors).await?;

        let mut results = Vec::new();
        if validate_only {
            results.extend(
                planned
                    .iter()
                    .map(|(index, task_id, _)| {
                        json!({ "index": index, "task_id": task_id, "status": "valid" })
                    }),
            );
        } else {
            let client = &self.client;
            let outcomes = run_in_batches(
                planned,
                self.settings.bulk_batch_size,
                self.settings.bulk_max_concurrent,
                |(index, task_id, request): PlannedUpdate| async move {
                    (index, task_id, client.update_task(task_id, &request).await)
                },
            )
            .await;

            for (index, task_id, outcome) in outcomes {
                match outcome {
                    Ok(task) => results.push(json!({
                        "index": index,
                        "task_id": task_id,
                        "status": "updated",
                        "task": task,
                    })),
                    Err(e) => errors.push(ItemError::new(index, Some(task_id), &e)),
                }
            }
        }

        errors.sort_by_key(|e| e.index);
        let execution_time = started.elapsed().as_secs_f64();
        info!(
            total = items.len(),
            successful = results.len(),
            failed = errors.len(),
            validate_only,
            "Bulk task update finished"
        );

        Ok(BulkOperationResult {
            operation_type: "bulk_update_tasks",
            total_items: items.len(),
            successful_items: results.len(),
            failed_items: errors.len(),
            errors,
            results,
            execution_time,
            validate_only,
        })
    }
}

#[async_trait]
impl Tool for BulkUpdateTasksTool {
    fn name(&self) -> &str {
        "bulk_update_tasks"
    }

    fn description(&self) -> &str {
        "Perform bulk updates on multiple tasks."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "updates": {
                    "type": "array",
                    "minItems": 1,
                    "maxItems": MAX_BULK_ITEMS,
                    "items": {
                        "type": "object",
                        "properties": { "task_id": { "type": "integer" } },
                        "required": ["task_id"]
                    },
                    "description": "List of task updates (each with task_id and fields to update)"
                },
                "validate_only": {
                    "type": "boolean",
                    "default": false,
                    "description": "Only validate updates without applying them"
                }
            },
            "required": ["updates"]
        })
    }

    async fn execute(&self, args: Args, _ctx: ToolContext) -> ToolCallResponse {
        args::respond(self.name(), self.run(&args).await)
    }
}

// =============================================================================
// export_data_to_csv
// =============================================================================

pub struct ExportDataToCsvTool {
    client: Arc<LiquidPlannerClient>,
}

impl ExportDataToCsvTool {
    pub fn new(client: Arc<LiquidPlannerClient>) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> Result<Value, LpError> {
        let data_type = DataType::parse(args::required_str(args, "data_type")?)?;
        let filters = Filters::from_value(args.get("filters"))?;
        let include_custom_fields = args::optional_bool(args, "include_custom_fields", true)?;

        let (csv_data, total_records) = match data_type {
            DataType::Tasks => {
                let tasks: Vec<_> = self
                    .client
                    .list_tasks(&filters.item_query())
                    .await?
                    .into_iter()
                    .filter(|t| filters.matches_task(t))
                    .collect();
                (export::tasks_csv(&tasks, include_custom_fields)?, tasks.len())
            }
            DataType::Projects => {
                let projects: Vec<_> = self
                    .client
                    .list_projects(&filters.item_query())
                    .await?
                    .into_iter()
                    .filter(|p| filters.matches_project(p))
                    .collect();
                (export::projects_csv(&projects, include_custom_fields)?, projects.len())
            }
            DataType::TimeEntries => {
                let entries: Vec<_> = self
                    .client
                    .list_timesheet_entries(&filters.time_entry_query())
                    .await?
                    .into_iter()
                    .filter(|e| filters.matches_time_entry(e))
                    .collect();
                (export::time_entries_csv(&entries)?, entries.len())
            }
        };

        info!(data_type = data_type.as_str(), total_records, "CSV export generated");

        Ok(json!({
            "data_type": data_type.as_str(),
            "csv_data": csv_data,
            "total_records": total_records,
            "export_timestamp": Utc::now().to_rfc3339(),
            "filters_applied": filters,
        }))
    }
}

#[async_trait]
impl Tool for ExportDataToCsvTool {
    fn name(&self) -> &str {
        "export_data_to_csv"
    }

    fn description(&self) -> &str {
        "Export LiquidPlanner data to CSV format."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "data_type": {
                    "type": "string",
                    "enum": ["tasks", "time_entries", "projects"],
                    "description": "Type of data to export: 'tasks', 'time_entries', 'projects'"
                },
                "filters": { "type": "object", "description": "Filters to apply" },
                "include_custom_fields": {
                    "type": "boolean",
                    "default": true,
                    "description": "Include custom field values"
                }
            },
            "required": ["data_type"]
        })
    }

    async fn execute(&self, args: Args, _ctx: ToolContext) -> ToolCallResponse {
        args::respond(self.name(), self.run(&args).await)
    }
}

// =============================================================================
// Tests
// =============================================================================
