// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Project tools.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::args::{self, Args};
use super::custom_fields::resolve_optional;
use super::registry::{Tool, ToolContext};
use crate::liquidplanner::models::{CreateProjectRequest, Filters, ItemType, Project};
use crate::liquidplanner::{LiquidPlannerClient, LpError};
use crate::mcp::protocol::ToolCallResponse;

#[derive(Debug, Serialize)]
struct ProjectList {
    projects: Vec<Project>,
    total_count: usize,
}

pub struct ListProjectsTool {
    client: Arc<LiquidPlannerClient>,
}

impl ListProjectsTool {
    pub fn new(client: Arc<LiquidPlannerClient>) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> Result<ProjectList, LpError> {
        let filters = Filters::from_value(args.get("filters"))?;
        let projects: Vec<Project> = self
            .client
            .list_projects(&filters.item_query())
            .await?
            .into_iter()
            .filter(|p| filters.matches_project(p))
            .collect();

        Ok(ProjectList {
            total_count: projects.len(),
            projects,
        })
    }
}

#[async_trait]
impl Tool for ListProjectsTool {
    fn name(&self) -> &str {
        "list_projects"
    }

    fn description(&self) -> &str {
        "List projects with optional filtering."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filters": {
                    "type": "object",
                    "description": "Filters for projects",
                    "properties": {
                        "is_done": { "type": "boolean" },
                        "include_done": { "type": "boolean" },
                        "parent_id": { "type": "integer" },
                        "name_contains": { "type": "string" }
                    }
                }
            }
        })
    }

    async fn execute(&self, args: Args, _ctx: ToolContext) -> ToolCallResponse {
        args::respond(self.name(), self.run(&args).await)
    }
}

pub struct CreateProjectTool {
    client: Arc<LiquidPlannerClient>,
}

impl CreateProjectTool {
    pub fn new(client: Arc<LiquidPlannerClient>) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> Result<Value, LpError> {
        let mut request = CreateProjectRequest {
            name: args::required_str(args, "name")?.trim().to_string(),
            client_id: args::optional_u64(args, "client_id")?,
            description: args::optional_str(args, "description")?,
            custom_field_values: None,
        };
        request.validate()?;

        request.custom_field_values = resolve_optional(
            &self.client,
            ItemType::Project,
            args::optional_object(args, "custom_fields")?,
        )
        .await?;

        let project = self.client.create_project(&request).await?;
        info!(project_id = project.id, name = %project.name, "Project created");

        Ok(json!({ "success": true, "project": project }))
    }
}

#[async_trait]
impl Tool for CreateProjectTool {
    fn name(&self) -> &str {
        "create_project"
    }

    fn description(&self) -> &str {
        "Create a new project."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "minLength": 1, "maxLength": 255, "description": "Name of the project" },
                "client_id": { "type": "integer", "description": "Client ID" },
                "description": { "type": "string", "maxLength": 10000, "description": "Project description" },
                "custom_fields": { "type": "object", "description": "Custom field values" }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, args: Args, _ctx: ToolContext) -> ToolCallResponse {
        args::respond(self.name(), self.run(&args).await)
    }
}
