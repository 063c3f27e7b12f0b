// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Reporting tools.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::args::{self, Args};
use super::registry::{Tool, ToolContext};
use crate::export;
use crate::liquidplanner::models::{parse_date, Filters, Project, TimeEntry};
use crate::liquidplanner::{LiquidPlannerClient, LpError};
use crate::mcp::protocol::ToolCallResponse;
use crate::timesheet::{project_status, TimesheetSummary};

// =============================================================================
// generate_timesheet_report
// =============================================================================

pub struct GenerateTimesheetReportTool {
    client: Arc<LiquidPlannerClient>,
}

impl GenerateTimesheetReportTool {
    pub fn new(client: Arc<LiquidPlannerClient>) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> Result<Value, LpError> {
        let start = parse_date("start_date", args::required_str(args, "start_date")?)?;
        let end = parse_date("end_date", args::required_str(args, "end_date")?)?;
        if end < start {
            return Err(LpError::invalid_field(
                "end_date",
                format!("end_date {} is before start_date {}", end, start),
            ));
        }

        let format = args::optional_str(args, "format")?
            .unwrap_or_else(|| "json".to_string())
            .to_lowercase();
        if format != "json" && format != "csv" {
            return Err(LpError::invalid_field(
                "format",
                format!("Unsupported format '{}'. Must be 'json' or 'csv'", format),
            ));
        }

        let mut filters = Filters::from_value(args.get("filters"))?;
        filters.start_date = Some(start);
        filters.end_date = Some(end);

        let entries: Vec<TimeEntry> = self
            .client
            .list_timesheet_entries(&filters.time_entry_query())
            .await?
            .into_iter()
            .filter(|e| filters.matches_time_entry(e))
            .collect();
        let summary = TimesheetSummary::from_entries(&entries);

        info!(
            start_date = %start,
            end_date = %end,
            entries = entries.len(),
            total_hours = summary.total_hours,
            "Timesheet report generated"
        );

        let mut report = json!({
            "report_type": "timesheet",
            "start_date": start,
            "end_date": end,
            "format": format,
            "generated_at": Utc::now().to_rfc3339(),
            "summary": summary,
        });
        if format == "csv" {
            report["csv_data"] = Value::from(export::time_entries_csv(&entries)?);
        } else {
            report["entries"] = serde_json::to_value(&entries)
                .map_err(|e| LpError::Decode(e.to_string()))?;
        }
        Ok(report)
    }
}

#[async_trait]
impl Tool for GenerateTimesheetReportTool {
    fn name(&self) -> &str {
        "generate_timesheet_report"
    }

    fn description(&self) -> &str {
        "Generate a timesheet report for the specified date range."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "start_date": { "type": "string", "description": "Start date (YYYY-MM-DD)" },
                "end_date": { "type": "string", "description": "End date (YYYY-MM-DD)" },
                "filters": { "type": "object", "description": "Additional filters (person_id, task_id)" },
                "format": {
                    "type": "string",
                    "enum": ["json", "csv"],
                    "default": "json",
                    "description": "Output format: 'json' or 'csv'"
                }
            },
            "required": ["start_date", "end_date"]
        })
    }

    async fn execute(&self, args: Args, _ctx: ToolContext) -> ToolCallResponse {
        args::respond(self.name(), self.run(&args).await)
    }
}

// =============================================================================
// generate_project_status_report
// =============================================================================

pub struct GenerateProjectStatusReportTool {
    client: Arc<LiquidPlannerClient>,
}

impl GenerateProjectStatusReportTool {
    pub fn new(client: Arc<LiquidPlannerClient>) -> Self {
        Self { client }
    }

    async fn projects(&self, ids: Option<Vec<u64>>) -> Result<Vec<Project>, LpError> {
        match ids {
            Some(ids) => {
                let mut projects = Vec::with_capacity(ids.len());
                for id in ids {
                    projects.push(self.client.get_project(id).await?);
                }
                Ok(projects)
            }
            None => self.client.list_projects(&Filters::default().item_query()).await,
        }
    }

    async fn run(&self, args: &Args) -> Result<Value, LpError> {
        let project_ids = args::optional_id_list(args, "project_ids")?;
        let include_tasks = args::optional_bool(args, "include_tasks", true)?;
        let include_time_tracking = args::optional_bool(args, "include_time_tracking", true)?;

        let projects = self.projects(project_ids).await?;

        let all_items = Filters {
            include_done: Some(true),
            ..Default::default()
        };
        let tasks = self.client.list_tasks(&all_items.item_query()).await?;
        let entries = if include_time_tracking {
            Some(self.client.list_timesheet_entries(&[]).await?)
        } else {
            None
        };

        let statuses: Vec<_> = projects
            .iter()
            .map(|p| project_status(p, &tasks, entries.as_deref(), include_tasks))
            .collect();

        let total_tasks: usize = statuses.iter().map(|s| s.total_tasks).sum();
        let completed_tasks: usize = statuses.iter().map(|s| s.completed_tasks).sum();
        let hours: Option<f64> = include_time_tracking.then(|| {
            let sum: f64 = statuses.iter().filter_map(|s| s.hours_logged).sum();
            (sum * 100.0).round() / 100.0
        });

        info!(projects = statuses.len(), total_tasks, "Project status report generated");

        Ok(json!({
            "report_type": "project_status",
            "generated_at": Utc::now().to_rfc3339(),
            "total_projects": statuses.len(),
            "totals": {
                "total_tasks": total_tasks,
                "completed_tasks": completed_tasks,
                "open_tasks": total_tasks - completed_tasks,
                "hours_logged": hours,
            },
            "projects": statuses,
        }))
    }
}

#[async_trait]
impl Tool for GenerateProjectStatusReportTool {
    fn name(&self) -> &str {
        "generate_project_status_report"
    }

    fn description(&self) -> &str {
        "Generate a comprehensive project status report."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_ids": {
                    "type": "array",
                    "items": { "type": "integer" },
                    "description": "Specific project IDs (or all projects)"
                },
                "include_tasks": { "type": "boolean", "default": true, "description": "Include task details" },
                "include_time_tracking": {
                    "type": "boolean",
                    "default": true,
                    "description": "Include time tracking data"
                }
            }
        })
    }

    async fn execute(&self, args: Args, _ctx: ToolContext) -> ToolCallResponse {
        args::respond(self.name(), self.run(&args).await)
    }
}
