// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Task tools.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::args::{self, Args};
use super::custom_fields::resolve_optional;
use super::registry::{Tool, ToolContext};
use crate::liquidplanner::models::{
    CreateTaskRequest, Filters, ItemType, Task, UpdateTaskRequest, TASK_UPDATE_FIELDS,
};
use crate::liquidplanner::{LiquidPlannerClient, LpError};
use crate::mcp::protocol::ToolCallResponse;

fn filters_schema() -> Value {
    json!({
        "type": "object",
        "description": "Filters for tasks",
        "properties": {
            "is_done": { "type": "boolean" },
            "include_done": { "type": "boolean" },
            "parent_id": { "type": "integer" },
            "project_id": { "type": "integer" },
            "owner_id": { "type": "integer" },
            "name_contains": { "type": "string" }
        }
    })
}

// =============================================================================
// list_tasks
// =============================================================================

#[derive(Debug, Serialize)]
struct TaskList {
    tasks: Vec<Task>,
    total_count: usize,
}

pub struct ListTasksTool {
    client: Arc<LiquidPlannerClient>,
}

impl ListTasksTool {
    pub fn new(client: Arc<LiquidPlannerClient>) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> Result<TaskList, LpError> {
        let filters = Filters::from_value(args.get("filters"))?;
        let limit = args::limit(args)?;

        let mut tasks: Vec<Task> = self
            .client
            .list_tasks(&filters.item_query())
            .await?
            .into_iter()
            .filter(|t| filters.matches_task(t))
            .collect();
        tasks.truncate(limit);

        Ok(TaskList {
            total_count: tasks.len(),
            tasks,
        })
    }
}

#[async_trait]
impl Tool for ListTasksTool {
    fn name(&self) -> &str {
        "list_tasks"
    }

    fn description(&self) -> &str {
        "List tasks with optional filtering."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filters": filters_schema(),
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 1000,
                    "default": 100,
                    "description": "Maximum number of tasks to return"
                }
            }
        })
    }

    async fn execute(&self, args: Args, _ctx: ToolContext) -> ToolCallResponse {
        args::respond(self.name(), self.run(&args).await)
    }
}

// =============================================================================
// get_task
// =============================================================================

pub struct GetTaskTool {
    client: Arc<LiquidPlannerClient>,
}

impl GetTaskTool {
    pub fn new(client: Arc<LiquidPlannerClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetTaskTool {
    fn name(&self) -> &str {
        "get_task"
    }

    fn description(&self) -> &str {
        "Get detailed information about a specific task."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task_id": { "type": "integer", "description": "ID of the task to retrieve" }
            },
            "required": ["task_id"]
        })
    }

    async fn execute(&self, args: Args, _ctx: ToolContext) -> ToolCallResponse {
        let result = match args::required_u64(&args, "task_id") {
            Ok(task_id) => self.client.get_task(task_id).await,
            Err(e) => Err(e),
        };
        args::respond(self.name(), result)
    }
}

// =============================================================================
// create_task
// =============================================================================

pub struct CreateTaskTool {
    client: Arc<LiquidPlannerClient>,
}

impl CreateTaskTool {
    pub fn new(client: Arc<LiquidPlannerClient>) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> Result<Value, LpError> {
        let mut request = CreateTaskRequest {
            name: args::required_str(args, "name")?.trim().to_string(),
            parent_id: args::required_u64(args, "parent_id")?,
            description: args::optional_str(args, "description")?,
            assignments: args::optional_array(args, "assignments")?,
            custom_field_values: None,
            priority: None,
        };
        if let Some(p) = args.get("priority").filter(|v| !v.is_null()) {
            request.priority = Some(p.as_i64().ok_or_else(|| {
                LpError::invalid_field("priority", "priority must be an integer")
            })?);
        }
        request.validate()?;

        request.custom_field_values = resolve_optional(
            &self.client,
            ItemType::Task,
            args::optional_object(args, "custom_fields")?,
        )
        .await?;

        let task = self.client.create_task(&request).await?;
        info!(task_id = task.id, parent_id = request.parent_id, "Task created");

        Ok(json!({ "success": true, "task": task }))
    }
}

#[async_trait]
impl Tool for CreateTaskTool {
    fn name(&self) -> &str {
        "create_task"
    }

    fn description(&self) -> &str {
        "Create a new task."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "minLength": 1, "maxLength": 255, "description": "Name of the task" },
                "parent_id": { "type": "integer", "description": "ID of parent project/folder/package" },
                "description": { "type": "string", "maxLength": 10000, "description": "Task description" },
                "assignments": {
                    "type": "array",
                    "items": { "type": "object" },
                    "description": "Task assignments"
                },
                "custom_fields": { "type": "object", "description": "Custom field values" },
                "priority": { "type": "integer", "minimum": 1, "maximum": 10 }
            },
            "required": ["name", "parent_id"]
        })
    }

    async fn execute(&self, args: Args, _ctx: ToolContext) -> ToolCallResponse {
        args::respond(self.name(), self.run(&args).await)
    }
}

// =============================================================================
// update_task
// =============================================================================

pub struct UpdateTaskTool {
    client: Arc<LiquidPlannerClient>,
}

impl UpdateTaskTool {
    pub fn new(client: Arc<LiquidPlannerClient>) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> Result<Value, LpError> {
        let task_id = args::required_u64(args, "task_id")?;
        let updates = args::optional_object(args, "updates")?.ok_or_else(|| {
            LpError::invalid_field("updates", "Missing required argument: updates")
        })?;

        let mut request = UpdateTaskRequest::from_updates(&updates)?;
        if let Some(Value::Object(raw)) = request.fields.remove("custom_field_values") {
            let resolved = resolve_optional(&self.client, ItemType::Task, Some(raw)).await?;
            if let Some(resolved) = resolved {
                request
                    .fields
                    .insert("custom_field_values".to_string(), Value::Object(resolved));
            }
        }

        let updated_fields: Vec<String> = request.fields.keys().cloned().collect();
        let task = self.client.update_task(task_id, &request).await?;
        info!(task_id, fields = ?updated_fields, "Task updated");

        Ok(json!({
            "success": true,
            "updated_fields": updated_fields,
            "task": task,
        }))
    }
}

#[async_trait]
impl Tool for UpdateTaskTool {
    fn name(&self) -> &str {
        "update_task"
    }

    fn description(&self) -> &str {
        "Update an existing task."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task_id": { "type": "integer", "description": "ID of the task to update" },
                "updates": {
                    "type": "object",
                    "description": format!("Fields to update: {}", TASK_UPDATE_FIELDS.join(", "))
                }
            },
            "required": ["task_id", "updates"]
        })
    }

    async fn execute(&self, args: Args, _ctx: ToolContext) -> ToolCallResponse {
        args::respond(self.name(), self.run(&args).await)
    }
}
