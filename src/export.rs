// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! CSV export of tasks, projects and time entries.
//!
//! Each data type has fixed leading columns. With custom fields enabled one
//! `cf:<name>` column is appended per field name seen in the data, sorted.

use csv::Writer;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::liquidplanner::models::{Project, Task, TimeEntry};
use crate::liquidplanner::LpError;

const TIME_ENTRY_COLUMNS: [&str; 9] = [
    "id",
    "task_id",
    "task_name",
    "person_id",
    "person_name",
    "work",
    "work_date",
    "note",
    "activity_id",
];

const TASK_COLUMNS: [&str; 10] = [
    "id",
    "name",
    "description",
    "parent_id",
    "project_id",
    "is_done",
    "owner_id",
    "priority",
    "work",
    "expected_finish",
];

const PROJECT_COLUMNS: [&str; 7] = [
    "id",
    "name",
    "description",
    "client_id",
    "client_name",
    "is_done",
    "parent_id",
];

/// Exportable data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Tasks,
    TimeEntries,
    Projects,
}

impl DataType {
    pub fn parse(s: &str) -> Result<Self, LpError> {
        match s.trim().to_lowercase().as_str() {
            "tasks" => Ok(DataType::Tasks),
            "time_entries" => Ok(DataType::TimeEntries),
            "projects" => Ok(DataType::Projects),
            other => Err(LpError::invalid_field(
                "data_type",
                format!(
                    "Unsupported data type '{}'. Must be one of: tasks, time_entries, projects",
                    other
                ),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Tasks => "tasks",
            DataType::TimeEntries => "time_entries",
            DataType::Projects => "projects",
        }
    }
}

fn opt<T: ToString>(v: &Option<T>) -> String {
    v.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn value_cell(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn custom_field_names<'a, I>(maps: I) -> Vec<String>
where
    I: Iterator<Item = Option<&'a Map<String, Value>>>,
{
    maps.flatten()
        .flat_map(|m| m.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String, LpError> {
    let bytes = writer.into_inner().map_err(|e| LpError::Csv {
        line: 0,
        message: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| LpError::Csv {
        line: 0,
        message: e.to_string(),
    })
}

fn write_row(writer: &mut Writer<Vec<u8>>, line: usize, row: Vec<String>) -> Result<(), LpError> {
    writer.write_record(&row).map_err(|e| LpError::Csv {
        line,
        message: e.to_string(),
    })
}

fn header(fixed: &[&str], custom: &[String]) -> Vec<String> {
    fixed
        .iter()
        .map(|s| s.to_string())
        .chain(custom.iter().map(|n| format!("cf:{}", n)))
        .collect()
}

fn custom_cells(values: Option<&Map<String, Value>>, names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|n| value_cell(values.and_then(|m| m.get(n))))
        .collect()
}

pub fn time_entries_csv(entries: &[TimeEntry]) -> Result<String, LpError> {
    let mut writer = Writer::from_writer(Vec::new());
    write_row(&mut writer, 1, header(&TIME_ENTRY_COLUMNS, &[]))?;

    for (i, e) in entries.iter().enumerate() {
        let row = vec![
            opt(&e.id),
            e.task_id.to_string(),
            opt(&e.task_name),
            opt(&e.person_id),
            opt(&e.person_name),
            e.work.to_string(),
            e.work_date.to_string(),
            opt(&e.note),
            opt(&e.activity_id),
        ];
        write_row(&mut writer, i + 2, row)?;
    }
    finish(writer)
}

pub fn tasks_csv(tasks: &[Task], include_custom_fields: bool) -> Result<String, LpError> {
    let custom = if include_custom_fields {
        custom_field_names(tasks.iter().map(|t| t.custom_field_values.as_ref()))
    } else {
        Vec::new()
    };

    let mut writer = Writer::from_writer(Vec::new());
    write_row(&mut writer, 1, header(&TASK_COLUMNS, &custom))?;

    for (i, t) in tasks.iter().enumerate() {
        let mut row = vec![
            t.id.to_string(),
            t.name.clone(),
            opt(&t.description),
            opt(&t.parent_id),
            opt(&t.project_id),
            t.is_done.to_string(),
            opt(&t.owner_id),
            opt(&t.priority),
            opt(&t.work),
            opt(&t.expected_finish),
        ];
        row.extend(custom_cells(t.custom_field_values.as_ref(), &custom));
        write_row(&mut writer, i + 2, row)?;
    }
    finish(writer)
}

pub fn projects_csv(projects: &[Project], include_custom_fields: bool) -> Result<String, LpError> {
    let custom = if include_custom_fields {
        custom_field_names(projects.iter().map(|p| p.custom_field_values.as_ref()))
    } else {
        Vec::new()
    };

    let mut writer = Writer::from_writer(Vec::new());
    write_row(&mut writer, 1, header(&PROJECT_COLUMNS, &custom))?;

    for (i, p) in projects.iter().enumerate() {
        let mut row = vec![
            p.id.to_string(),
            p.name.clone(),
            opt(&p.description),
            opt(&p.client_id),
            opt(&p.client_name),
            p.is_done.to_string(),
            opt(&p.parent_id),
        ];
        row.extend(custom_cells(p.custom_field_values.as_ref(), &custom));
        write_row(&mut writer, i + 2, row)?;
    }
    finish(writer)
}
