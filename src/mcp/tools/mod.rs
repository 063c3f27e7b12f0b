// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! MCP Tools Module
//!
//! Tool registry and the LiquidPlanner tool implementations.

pub mod args;
pub mod bulk;
pub mod custom_fields;
pub mod health;
pub mod projects;
pub mod registry;
pub mod reports;
pub mod tasks;
pub mod time_entries;

use std::sync::Arc;

use crate::config::Config;
use crate::liquidplanner::LiquidPlannerClient;
use crate::metrics::Metrics;
use crate::timesheet::DeduplicationRule;

pub use registry::{Tool, ToolContext, ToolRegistry};

/// Settings shared by the bulk and import tools.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    pub bulk_batch_size: usize,
    pub bulk_max_concurrent: usize,
    /// Defaults applied under caller-supplied deduplication rules
    pub deduplication: DeduplicationRule,
    /// Tasks never imported, on top of per-call blacklists
    pub blacklisted_tasks: Vec<u64>,
}

impl ToolSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bulk_batch_size: config.bulk_batch_size,
            bulk_max_concurrent: config.bulk_max_concurrent,
            deduplication: DeduplicationRule {
                enabled: config.time_entry_deduplication,
                precedence_users: config.time_entry_user_precedence.clone(),
                ..Default::default()
            },
            blacklisted_tasks: config.time_entry_blacklisted_tasks.clone(),
        }
    }
}

/// Build a registry with every LiquidPlanner tool registered.
pub fn build_registry(
    client: Arc<LiquidPlannerClient>,
    settings: ToolSettings,
    metrics: Metrics,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new().with_metrics(metrics);

    // Custom fields
    registry.register(custom_fields::ListCustomFieldsTool::new(client.clone()));
    registry.register(custom_fields::GetCustomFieldValuesTool::new(client.clone()));
    registry.register(custom_fields::UpdateCustomFieldsTool::new(client.clone()));

    // Time entries
    registry.register(time_entries::ListTimeEntriesTool::new(client.clone()));
    registry.register(time_entries::CreateTimeEntryTool::new(client.clone()));
    registry.register(time_entries::BulkImportTimeEntriesTool::new(
        client.clone(),
        settings.clone(),
    ));

    // Tasks and projects
    registry.register(tasks::ListTasksTool::new(client.clone()));
    registry.register(tasks::GetTaskTool::new(client.clone()));
    registry.register(tasks::CreateTaskTool::new(client.clone()));
    registry.register(tasks::UpdateTaskTool::new(client.clone()));
    registry.register(projects::ListProjectsTool::new(client.clone()));
    registry.register(projects::CreateProjectTool::new(client.clone()));

    // Reports
    registry.register(reports::GenerateTimesheetReportTool::new(client.clone()));
    registry.register(reports::GenerateProjectStatusReportTool::new(client.clone()));

    // Bulk operations
    registry.register(bulk::BulkUpdateTasksTool::new(client.clone(), settings));
    registry.register(bulk::ExportDataToCsvTool::new(client.clone()));

    registry.register(health::HealthCheckTool::new(client));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::NoopCache;

    fn config() -> Config {
        Config::from_pairs(vec![
            ("LP_API_TOKEN", "tok"),
            ("LP_WORKSPACE_ID", "3"),
            ("TIME_ENTRY_USER_PRECEDENCE", "alice,bob"),
            ("TIME_ENTRY_BLACKLISTED_TASKS", "99"),
        ])
        .unwrap()
    }

    #[test]
    fn test_settings_from_config() {
        let settings = ToolSettings::from_config(&config());
        assert_eq!(settings.bulk_batch_size, 100);
        assert_eq!(settings.bulk_max_concurrent, 5);
        assert_eq!(settings.deduplication.precedence_users, vec!["alice", "bob"]);
        assert_eq!(settings.deduplication.duplicate_threshold_hours, 0.01);
        assert_eq!(settings.blacklisted_tasks, vec![99]);
    }

    #[test]
    fn test_registry_has_all_tools() {
        let config = config();
        let metrics = Metrics::new();
        let client = Arc::new(
            LiquidPlannerClient::new(&config, Arc::new(NoopCache), metrics.clone()).unwrap(),
        );
        let registry = build_registry(client, ToolSettings::from_config(&config), metrics);

        let names: Vec<String> = registry.list().into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "bulk_import_time_entries",
                "bulk_update_tasks",
                "create_project",
                "create_task",
                "create_time_entry",
                "export_data_to_csv",
                "generate_project_status_report",
                "generate_timesheet_report",
                "get_custom_field_values",
                "get_task",
                "health_check",
                "list_custom_fields",
                "list_projects",
                "list_tasks",
                "list_time_entries",
                "update_custom_fields",
                "update_task",
            ]
        );
    }
}
