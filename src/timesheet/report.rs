// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Timesheet and project status aggregation.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::liquidplanner::models::{Project, Task, TimeEntry};

/// Hours rounded to two decimals for presentation.
fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

// =============================================================================
// Timesheet Summary
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimesheetSummary {
    pub total_hours: f64,
    pub entry_count: usize,
    pub by_person: BTreeMap<String, f64>,
    pub by_task: BTreeMap<String, f64>,
    pub by_date: BTreeMap<NaiveDate, f64>,
}

impl TimesheetSummary {
    pub fn from_entries(entries: &[TimeEntry]) -> Self {
        let mut summary = Self {
            entry_count: entries.len(),
            ..Default::default()
        };

        for entry in entries {
            summary.total_hours += entry.work;

            let person = entry.person_key().unwrap_or_else(|| "unassigned".to_string());
            *summary.by_person.entry(person).or_default() += entry.work;

            let task = match &entry.task_name {
                Some(name) => format!("{} ({})", name, entry.task_id),
                None => entry.task_id.to_string(),
            };
            *summary.by_task.entry(task).or_default() += entry.work;

            *summary.by_date.entry(entry.work_date).or_default() += entry.work;
        }

        summary.total_hours = round_hours(summary.total_hours);
        for hours in summary
            .by_person
            .values_mut()
            .chain(summary.by_task.values_mut())
            .chain(summary.by_date.values_mut())
        {
            *hours = round_hours(*hours);
        }
        summary
    }
}

// =============================================================================
// Project Status
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TaskSummary {
    pub id: u64,
    pub name: String,
    pub is_done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_finish: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectStatus {
    pub project_id: u64,
    pub name: String,
    pub is_done: bool,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub open_tasks: usize,
    pub percent_complete: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<TaskSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_logged: Option<f64>,
}

/// Whether `task` belongs to `project`.
pub fn task_in_project(task: &Task, project_id: u64) -> bool {
    task.project_id == Some(project_id) || task.parent_id == Some(project_id)
}

/// Status of one project from its tasks and, optionally, logged time.
pub fn project_status(
    project: &Project,
    tasks: &[Task],
    entries: Option<&[TimeEntry]>,
    include_tasks: bool,
) -> ProjectStatus {
    let own: Vec<&Task> = tasks
        .iter()
        .filter(|t| task_in_project(t, project.id))
        .collect();
    let completed = own.iter().filter(|t| t.is_done).count();
    let total = own.len();
    let percent_complete = if total == 0 {
        0.0
    } else {
        round_hours(completed as f64 * 100.0 / total as f64)
    };

    let hours_logged = entries.map(|entries| {
        let ids: HashSet<u64> = own.iter().map(|t| t.id).collect();
        round_hours(
            entries
                .iter()
                .filter(|e| ids.contains(&e.task_id))
                .map(|e| e.work)
                .sum(),
        )
    });

    let task_list = include_tasks.then(|| {
        own.iter()
            .map(|t| TaskSummary {
                id: t.id,
                name: t.name.clone(),
                is_done: t.is_done,
                owner_id: t.owner_id,
                expected_finish: t.expected_finish.clone(),
            })
            .collect()
    });

    ProjectStatus {
        project_id: project.id,
        name: project.name.clone(),
        is_done: project.is_done,
        total_tasks: total,
        completed_tasks: completed,
        open_tasks: total - completed,
        percent_complete,
        tasks: task_list,
        hours_logged,
    }
}
