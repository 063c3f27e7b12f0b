// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Time entry tools: listing, single entry creation and CSV bulk import.
//!
//! Bulk import flow:
//! 1. Parse CSV rows (row errors are collected, not fatal)
//! 2. Drop blacklisted tasks
//! 3. Resolve person names to member ids
//! 4. Validate each entry
//! 5. Deduplicate within the batch and against existing entries
//! 6. Create entries in bounded-concurrency batches

use async_trait::async_trait;
use chrono::Local;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use super::args::{self, Args};
use super::bulk::run_in_batches;
use super::registry::{Tool, ToolContext};
use super::ToolSettings;
use crate::liquidplanner::models::{parse_date, CreateTimeEntryRequest, Filters, TimeEntry};
use crate::liquidplanner::{LiquidPlannerClient, LpError};
use crate::mcp::protocol::ToolCallResponse;
use crate::timesheet::{
    deduplicate, parse_time_entries, DeduplicationResult, DeduplicationRule, ImportedEntry,
    RowError,
};

// =============================================================================
// list_time_entries
// =============================================================================

#[derive(Debug, Serialize)]
struct TimeEntryList {
    time_entries: Vec<TimeEntry>,
    total_count: usize,
    total_hours: f64,
}

pub struct ListTimeEntriesTool {
    client: Arc<LiquidPlannerClient>,
}

impl ListTimeEntriesTool {
    pub fn new(client: Arc<LiquidPlannerClient>) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> Result<TimeEntryList, LpError> {
        let filters = Filters::from_value(args.get("filters"))?;
        let limit = args::limit(args)?;

        let mut entries: Vec<TimeEntry> = self
            .client
            .list_timesheet_entries(&filters.time_entry_query())
            .await?
            .into_iter()
            .filter(|e| filters.matches_time_entry(e))
            .collect();
        entries.truncate(limit);

        let total_hours = (entries.iter().map(|e| e.work).sum::<f64>() * 100.0).round() / 100.0;
        Ok(TimeEntryList {
            total_count: entries.len(),
            total_hours,
            time_entries: entries,
        })
    }
}

#[async_trait]
impl Tool for ListTimeEntriesTool {
    fn name(&self) -> &str {
        "list_time_entries"
    }

    fn description(&self) -> &str {
        "List time entries with optional filtering."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filters": {
                    "type": "object",
                    "description": "Filters for time entries",
                    "properties": {
                        "person_id": { "type": "integer" },
                        "task_id": { "type": "integer" },
                        "start_date": { "type": "string", "format": "date" },
                        "end_date": { "type": "string", "format": "date" }
                    }
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 1000,
                    "default": 100,
                    "description": "Maximum number of entries to return"
                }
            }
        })
    }

    async fn execute(&self, args: Args, _ctx: ToolContext) -> ToolCallResponse {
        args::respond(self.name(), self.run(&args).await)
    }
}

// =============================================================================
// create_time_entry
// =============================================================================

pub struct CreateTimeEntryTool {
    client: Arc<LiquidPlannerClient>,
}

impl CreateTimeEntryTool {
    pub fn new(client: Arc<LiquidPlannerClient>) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> Result<Value, LpError> {
        let request = CreateTimeEntryRequest {
            task_id: args::required_u64(args, "task_id")?,
            work: args::required_f64(args, "work")?,
            work_date: parse_date("work_date", args::required_str(args, "work_date")?)?,
            person_id: args::optional_u64(args, "person_id")?,
            note: args::optional_str(args, "note")?,
            activity_id: args::optional_u64(args, "activity_id")?,
        };
        request.validate(Local::now().date_naive())?;

        let created = self.client.track_time(&request).await?;
        info!(
            task_id = request.task_id,
            work = request.work,
            work_date = %request.work_date,
            "Time entry created"
        );

        Ok(json!({
            "success": true,
            "task_id": request.task_id,
            "work": request.work,
            "work_date": request.work_date,
            "time_entry": created,
        }))
    }
}

#[async_trait]
impl Tool for CreateTimeEntryTool {
    fn name(&self) -> &str {
        "create_time_entry"
    }

    fn description(&self) -> &str {
        "Create a new time entry."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task_id": { "type": "integer", "description": "ID of the task to log time for" },
                "work": {
                    "type": "number",
                    "exclusiveMinimum": 0,
                    "maximum": 24,
                    "description": "Hours of work to log"
                },
                "work_date": { "type": "string", "description": "Date of work (YYYY-MM-DD format)" },
                "person_id": { "type": "integer", "description": "Person ID (defaults to current user)" },
                "note": { "type": "string", "maxLength": 1000, "description": "Note for the time entry" },
                "activity_id": { "type": "integer", "description": "Activity ID" }
            },
            "required": ["task_id", "work", "work_date"]
        })
    }

    async fn execute(&self, args: Args, _ctx: ToolContext) -> ToolCallResponse {
        args::respond(self.name(), self.run(&args).await)
    }
}

// =============================================================================
// bulk_import_time_entries
// =============================================================================

#[derive(Debug, Serialize)]
struct SkippedItem {
    line: usize,
    task_id: u64,
    reason: &'static str,
}

#[derive(Debug, Serialize)]
struct ImportedItem {
    line: usize,
    task_id: u64,
    work: f64,
    work_date: String,
    result: Value,
}

#[derive(Debug, Serialize)]
pub struct BulkImportResult {
    total_rows: usize,
    successful_rows: usize,
    failed_rows: usize,
    errors: Vec<RowError>,
    imported_items: Vec<ImportedItem>,
    skipped_items: Vec<SkippedItem>,
    deduplication: DeduplicationResult,
    validation_only: bool,
}

pub struct BulkImportTimeEntriesTool {
    client: Arc<LiquidPlannerClient>,
    settings: ToolSettings,
}

impl BulkImportTimeEntriesTool {
    pub fn new(client: Arc<LiquidPlannerClient>, settings: ToolSettings) -> Self {
        Self { client, settings }
    }

    /// Fill `person_id` from workspace members where only a name was given.
    async fn resolve_people(
        &self,
        rows: Vec<ImportedEntry>,
        errors: &mut Vec<RowError>,
    ) -> Result<Vec<ImportedEntry>, LpError> {
        let needs_lookup = rows
            .iter()
            .any(|r| r.entry.person_id.is_none() && r.entry.person_name.is_some());
        if !needs_lookup {
            return Ok(rows);
        }

        let members = self.client.list_members().await?;
        let mut resolved = Vec::with_capacity(rows.len());
        for mut row in rows {
            if row.entry.person_id.is_none() {
                if let Some(name) = row.entry.person_name.clone() {
                    match members.iter().find(|m| m.matches(&name)) {
                        Some(member) => row.entry.person_id = Some(member.id),
                        None => {
                            errors.push(RowError::new(
                                row.line,
                                format!("unknown person '{}'", name),
                            ));
                            continue;
                        }
                    }
                }
            }
            resolved.push(row);
        }
        Ok(resolved)
    }

    /// Upstream entries overlapping the import's date range.
    async fn existing_entries(&self, rows: &[ImportedEntry]) -> Vec<TimeEntry> {
        let dates = rows.iter().map(|r| r.entry.work_date);
        let (Some(start), Some(end)) = (dates.clone().min(), dates.max()) else {
            return Vec::new();
        };
        let filters = Filters {
            start_date: Some(start),
            end_date: Some(end),
            ..Default::default()
        };
        match self
            .client
            .list_timesheet_entries(&filters.time_entry_query())
            .await
        {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    error = %e,
                    "Could not load existing entries, deduplicating within the import only"
                );
                Vec::new()
            }
        }
    }

    async fn run(&self, args: &Args) -> Result<BulkImportResult, LpError> {
        let csv_data = args::required_str(args, "csv_data")?;
        let rule = DeduplicationRule::from_value(
            args.get("deduplication_rules"),
            &self.settings.deduplication,
        )?;
        let validation_only = args::optional_bool(args, "validation_only", false)?;

        let blacklist: HashSet<u64> = args::optional_id_list(args, "blacklisted_tasks")?
            .unwrap_or_default()
            .into_iter()
            .chain(self.settings.blacklisted_tasks.iter().copied())
            .collect();

        let parsed = parse_time_entries(csv_data)?;
        let total_rows = parsed.total_rows;
        let mut errors = parsed.errors;

        let mut skipped_items = Vec::new();
        let rows: Vec<ImportedEntry> = parsed
            .rows
            .into_iter()
            .filter(|r| {
                if blacklist.contains(&r.entry.task_id) {
                    skipped_items.push(SkippedItem {
                        line: r.line,
                        task_id: r.entry.task_id,
                        reason: "blacklisted_task",
                    });
                    false
                } else {
                    true
                }
            })
            .collect();

        let rows = self.resolve_people(rows, &mut errors).await?;

        let today = Local::now().date_naive();
        let rows: Vec<ImportedEntry> = rows
            .into_iter()
            .filter(|r| match r.to_request().validate(today) {
                Ok(()) => true,
                Err(e) => {
                    errors.push(RowError::new(r.line, e.to_string()));
                    false
                }
            })
            .collect();

        let existing = if rule.enabled && !rows.is_empty() {
            self.existing_entries(&rows).await
        } else {
            Vec::new()
        };
        let mut dedup = deduplicate(rows, &existing, &rule);
        let to_import = std::mem::take(&mut dedup.entries);

        info!(
            total_rows,
            to_import = to_import.len(),
            duplicates = dedup.duplicates_found,
            blacklisted = skipped_items.len(),
            invalid = errors.len(),
            validation_only,
            "Bulk time entry import prepared"
        );

        let mut imported_items = Vec::new();
        let successful_rows = if validation_only {
            to_import.len()
        } else {
            let client = &self.client;
            let outcomes = run_in_batches(
                to_import,
                self.settings.bulk_batch_size,
                self.settings.bulk_max_concurrent,
                |row: ImportedEntry| async move {
                    let request = row.to_request();
                    let result = client.track_time(&request).await;
                    (row, result)
                },
            )
            .await;

            for (row, result) in outcomes {
                match result {
                    Ok(value) => imported_items.push(ImportedItem {
                        line: row.line,
                        task_id: row.entry.task_id,
                        work: row.entry.work,
                        work_date: row.entry.work_date.to_string(),
                        result: value,
                    }),
                    Err(e) => errors.push(RowError::new(row.line, e.to_string())),
                }
            }
            imported_items.len()
        };

        errors.sort_by_key(|e| e.line);
        Ok(BulkImportResult {
            total_rows,
            successful_rows,
            failed_rows: errors.len(),
            errors,
            imported_items,
            skipped_items,
            deduplication: dedup,
            validation_only,
        })
    }
}

#[async_trait]
impl Tool for BulkImportTimeEntriesTool {
    fn name(&self) -> &str {
        "bulk_import_time_entries"
    }

    fn description(&self) -> &str {
        "Bulk import time entries from CSV data with deduplication."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "csv_data": {
                    "type": "string",
                    "description": "CSV data containing time entries (header: task_id, work, work_date, person_id/person, note, activity_id)"
                },
                "deduplication_rules": {
                    "type": "object",
                    "description": "Rules for handling duplicates",
                    "properties": {
                        "enabled": { "type": "boolean" },
                        "precedence_users": { "type": "array", "items": { "type": "string" } },
                        "skip_duplicates": { "type": "boolean" },
                        "merge_duplicates": { "type": "boolean" },
                        "duplicate_threshold_hours": { "type": "number", "minimum": 0 }
                    }
                },
                "blacklisted_tasks": {
                    "type": "array",
                    "items": { "type": "integer" },
                    "description": "Task IDs to exclude from import"
                },
                "validation_only": {
                    "type": "boolean",
                    "default": false,
                    "description": "Validate and deduplicate without creating entries"
                }
            },
            "required": ["csv_data"]
        })
    }

    async fn execute(&self, args: Args, _ctx: ToolContext) -> ToolCallResponse {
        args::respond(self.name(), self.run(&args).await)
    }
}
