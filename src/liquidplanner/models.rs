// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! LiquidPlanner Models
//!
//! Serde types for upstream resources and validated request payloads.
//! Upstream objects keep unknown fields in `extra` so nothing is lost when
//! they are passed back to MCP clients.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::error::LpError;

// =============================================================================
// Item Types
// =============================================================================

/// Tree item kinds that carry custom fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Task,
    Project,
    Folder,
    Package,
}

impl ItemType {
    pub fn parse(s: &str) -> Result<Self, LpError> {
        match s.trim().to_lowercase().as_str() {
            "task" | "tasks" => Ok(ItemType::Task),
            "project" | "projects" => Ok(ItemType::Project),
            "folder" | "folders" => Ok(ItemType::Folder),
            "package" | "packages" => Ok(ItemType::Package),
            other => Err(LpError::invalid_field(
                "item_type",
                format!(
                    "Invalid item type '{}'. Must be one of: task, project, folder, package",
                    other
                ),
            )),
        }
    }

    /// Collection segment in API paths.
    pub fn collection(&self) -> &'static str {
        match self {
            ItemType::Task => "tasks",
            ItemType::Project => "projects",
            ItemType::Folder => "folders",
            ItemType::Package => "packages",
        }
    }

    /// Wrapper key for request bodies (`{"task": {...}}`).
    pub fn body_key(&self) -> &'static str {
        match self {
            ItemType::Task => "task",
            ItemType::Project => "project",
            ItemType::Folder => "folder",
            ItemType::Package => "package",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.body_key())
    }
}

// =============================================================================
// Upstream Resources
// =============================================================================

/// The authenticated account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Workspace member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Member {
    /// Whether `name` refers to this member (user name, email or full name).
    pub fn matches(&self, name: &str) -> bool {
        let needle = name.trim().to_lowercase();
        let full = match (&self.first_name, &self.last_name) {
            (Some(f), Some(l)) => Some(format!("{} {}", f, l).to_lowercase()),
            _ => None,
        };
        [
            self.user_name.as_ref().map(|s| s.to_lowercase()),
            self.email.as_ref().map(|s| s.to_lowercase()),
            full,
        ]
        .into_iter()
        .flatten()
        .any(|candidate| candidate == needle)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub is_done: bool,
    #[serde(default)]
    pub done_on: Option<String>,
    #[serde(default)]
    pub owner_id: Option<u64>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub work: Option<f64>,
    #[serde(default)]
    pub low_effort_remaining: Option<f64>,
    #[serde(default)]
    pub high_effort_remaining: Option<f64>,
    #[serde(default)]
    pub expected_finish: Option<String>,
    #[serde(default)]
    pub custom_field_values: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub client_id: Option<u64>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub is_done: bool,
    #[serde(default)]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub custom_field_values: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A logged block of work against a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(alias = "item_id")]
    pub task_id: u64,
    #[serde(default)]
    pub task_name: Option<String>,
    #[serde(default, alias = "member_id")]
    pub person_id: Option<u64>,
    #[serde(default, alias = "member_name")]
    pub person_name: Option<String>,
    /// Hours
    pub work: f64,
    #[serde(alias = "work_performed_on")]
    pub work_date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub activity_id: Option<u64>,
}

impl TimeEntry {
    /// Identity used when ranking entries by user precedence.
    pub fn person_key(&self) -> Option<String> {
        self.person_name
            .clone()
            .or_else(|| self.person_id.map(|id| id.to_string()))
    }
}

/// Custom field definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomField {
    pub id: u64,
    pub name: String,
    #[serde(alias = "type", default = "default_field_type")]
    pub field_type: String,
    #[serde(default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub picklist_values: Option<Vec<String>>,
}

fn default_field_type() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}

impl CustomField {
    /// Whether this definition applies to `item_type`. Definitions without
    /// an item type apply everywhere.
    pub fn applies_to(&self, item_type: ItemType) -> bool {
        match &self.item_type {
            None => true,
            Some(t) => ItemType::parse(t).map(|t| t == item_type).unwrap_or(false),
        }
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Filters accepted by list tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl Filters {
    pub fn from_value(value: Option<&Value>) -> Result<Self, LpError> {
        match value {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|e| LpError::invalid_field("filters", format!("Invalid filters: {}", e))),
        }
    }

    /// Upstream query for tree-item listings (tasks, projects).
    pub fn item_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        let mut push = |clause: String| query.push(("filter[]".to_string(), clause));

        match (self.is_done, self.include_done) {
            (Some(done), _) => push(format!("is_done is {}", done)),
            (None, Some(true)) => {}
            _ => push("is_done is false".to_string()),
        }
        if let Some(id) = self.parent_id {
            push(format!("parent_id = {}", id));
        }
        if let Some(id) = self.project_id {
            push(format!("project_id = {}", id));
        }
        if let Some(id) = self.owner_id {
            push(format!("owner_id = {}", id));
        }
        query
    }

    /// Upstream query for timesheet entry listings.
    pub fn time_entry_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(d) = self.start_date {
            query.push(("start_date".to_string(), d.to_string()));
        }
        if let Some(d) = self.end_date {
            query.push(("end_date".to_string(), d.to_string()));
        }
        if let Some(id) = self.person_id {
            query.push(("member_id".to_string(), id.to_string()));
        }
        query
    }

    /// Local filtering for criteria the upstream query cannot express.
    pub fn matches_task(&self, task: &Task) -> bool {
        if let Some(done) = self.is_done {
            if task.is_done != done {
                return false;
            }
        } else if self.include_done != Some(true) && task.is_done {
            return false;
        }
        if let Some(needle) = &self.name_contains {
            if !task.name.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        true
    }

    pub fn matches_project(&self, project: &Project) -> bool {
        if let Some(done) = self.is_done {
            if project.is_done != done {
                return false;
            }
        } else if self.include_done != Some(true) && project.is_done {
            return false;
        }
        if let Some(needle) = &self.name_contains {
            if !project.name.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        true
    }

    pub fn matches_time_entry(&self, entry: &TimeEntry) -> bool {
        if let Some(id) = self.task_id {
            if entry.task_id != id {
                return false;
            }
        }
        if let Some(id) = self.person_id {
            if entry.person_id != Some(id) {
                return false;
            }
        }
        if let Some(start) = self.start_date {
            if entry.work_date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if entry.work_date > end {
                return false;
            }
        }
        true
    }
}

// =============================================================================
// Requests
// =============================================================================

const MAX_NAME_LEN: usize = 255;
const MAX_DESCRIPTION_LEN: usize = 10_000;
const MAX_NOTE_LEN: usize = 1_000;
const MAX_HOURS_PER_ENTRY: f64 = 24.0;

fn check_name(name: &str) -> Result<(), LpError> {
    let len = name.trim().chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(LpError::invalid_field(
            "name",
            format!("Name must be 1..={} characters", MAX_NAME_LEN),
        ));
    }
    Ok(())
}

fn check_description(description: Option<&str>) -> Result<(), LpError> {
    if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN) {
        return Err(LpError::invalid_field(
            "description",
            format!("Description exceeds {} characters", MAX_DESCRIPTION_LEN),
        ));
    }
    Ok(())
}

fn check_priority(priority: Option<i64>) -> Result<(), LpError> {
    if priority.is_some_and(|p| !(1..=10).contains(&p)) {
        return Err(LpError::invalid_field("priority", "Priority must be 1..=10"));
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, LpError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        LpError::invalid_field(field, format!("Invalid date '{}', expected YYYY-MM-DD", value))
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTaskRequest {
    pub name: String,
    pub parent_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignments: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_field_values: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

impl CreateTaskRequest {
    pub fn validate(&self) -> Result<(), LpError> {
        check_name(&self.name)?;
        if self.parent_id == 0 {
            return Err(LpError::invalid_field("parent_id", "parent_id must be positive"));
        }
        check_description(self.description.as_deref())?;
        check_priority(self.priority)
    }
}

/// Fields that `update_task` forwards upstream.
pub const TASK_UPDATE_FIELDS: [&str; 10] = [
    "name",
    "description",
    "is_done",
    "priority",
    "promise_by",
    "promise_to_start_on",
    "promise_to_finish_on",
    "owner_id",
    "assignments",
    "custom_field_values",
];

/// Validated partial update for a task.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateTaskRequest {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl UpdateTaskRequest {
    /// Validate an update map; unknown keys are rejected.
    pub fn from_updates(updates: &Map<String, Value>) -> Result<Self, LpError> {
        if updates.is_empty() {
            return Err(LpError::invalid_field("updates", "No fields to update"));
        }

        let mut fields = Map::new();
        for (key, value) in updates {
            let key = if key == "custom_fields" { "custom_field_values" } else { key.as_str() };
            if !TASK_UPDATE_FIELDS.contains(&key) {
                return Err(LpError::invalid_field(
                    key,
                    format!(
                        "Field '{}' cannot be updated. Allowed: {}",
                        key,
                        TASK_UPDATE_FIELDS.join(", ")
                    ),
                ));
            }

            match key {
                "name" => check_name(value.as_str().ok_or_else(|| {
                    LpError::invalid_field("name", "name must be a string")
                })?)?,
                "description" => {
                    let text = value.as_str().ok_or_else(|| {
                        LpError::invalid_field("description", "description must be a string")
                    })?;
                    check_description(Some(text))?
                }
                "is_done" if !value.is_boolean() => {
                    return Err(LpError::invalid_field("is_done", "is_done must be a boolean"))
                }
                "priority" => check_priority(Some(value.as_i64().ok_or_else(|| {
                    LpError::invalid_field("priority", "priority must be an integer")
                })?))?,
                "promise_by" | "promise_to_start_on" | "promise_to_finish_on" => {
                    let text = value.as_str().ok_or_else(|| {
                        LpError::invalid_field(key, format!("{} must be a date string", key))
                    })?;
                    parse_date(key, text)?;
                }
                "custom_field_values" if !value.is_object() => {
                    return Err(LpError::invalid_field(key, "custom fields must be an object"))
                }
                "assignments" if !value.is_array() => {
                    return Err(LpError::invalid_field(key, "assignments must be an array"))
                }
                _ => {}
            }

            fields.insert(key.to_string(), value.clone());
        }

        Ok(Self { fields })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_field_values: Option<Map<String, Value>>,
}

impl CreateProjectRequest {
    pub fn validate(&self) -> Result<(), LpError> {
        check_name(&self.name)?;
        if self.client_id == Some(0) {
            return Err(LpError::invalid_field("client_id", "client_id must be positive"));
        }
        check_description(self.description.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateTimeEntryRequest {
    pub task_id: u64,
    pub work: f64,
    pub work_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<u64>,
}

impl CreateTimeEntryRequest {
    /// Validate against `today` (work dates may not lie in the future).
    pub fn validate(&self, today: NaiveDate) -> Result<(), LpError> {
        let fail = |message: String| LpError::TimeEntry {
            task_id: self.task_id,
            message,
        };

        if self.task_id == 0 {
            return Err(fail("task_id must be positive".to_string()));
        }
        if !(self.work > 0.0 && self.work <= MAX_HOURS_PER_ENTRY) {
            return Err(fail(format!(
                "work must be greater than 0 and at most {} hours, got {}",
                MAX_HOURS_PER_ENTRY, self.work
            )));
        }
        if self.work_date > today {
            return Err(fail(format!(
                "work date {} cannot be in the future",
                self.work_date
            )));
        }
        if self.note.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTE_LEN) {
            return Err(fail(format!("note exceeds {} characters", MAX_NOTE_LEN)));
        }
        if self.person_id == Some(0) || self.activity_id == Some(0) {
            return Err(fail("person_id and activity_id must be positive".to_string()));
        }
        Ok(())
    }

    /// Upstream `track_time` body.
    pub fn to_track_time_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("work".into(), Value::from(self.work));
        body.insert(
            "work_performed_on".into(),
            Value::from(self.work_date.to_string()),
        );
        if let Some(id) = self.person_id {
            body.insert("member_id".into(), Value::from(id));
        }
        if let Some(id) = self.activity_id {
            body.insert("activity_id".into(), Value::from(id));
        }
        if let Some(note) = &self.note {
            body.insert("note".into(), Value::from(note.clone()));
        }
        Value::Object(body)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_item_type_parse() {
        assert_eq!(ItemType::parse("Task").unwrap(), ItemType::Task);
        assert_eq!(ItemType::parse("packages").unwrap(), ItemType::Package);
        assert!(ItemType::parse("milestone").is_err());
        assert_eq!(ItemType::Folder.collection(), "folders");
    }

    #[test]
    fn test_time_entry_upstream_aliases() {
        let entry: TimeEntry = serde_json::from_value(json!({
            "id": 9,
            "item_id": 100,
            "member_id": 7,
            "work": 1.5,
            "work_performed_on": "2024-03-01",
            "note": "standup"
        }))
        .unwrap();

        assert_eq!(entry.task_id, 100);
        assert_eq!(entry.person_id, Some(7));
        assert_eq!(entry.work_date, date("2024-03-01"));
        assert_eq!(entry.person_key().as_deref(), Some("7"));
    }

    #[test]
    fn test_task_preserves_unknown_fields() {
        let task: Task = serde_json::from_value(json!({
            "id": 1,
            "name": "Write docs",
            "package_id": 55
        }))
        .unwrap();
        assert_eq!(task.extra.get("package_id"), Some(&json!(55)));

        let back = serde_json::to_value(&task).unwrap();
        assert_eq!(back["package_id"], 55);
    }

    #[test]
    fn test_create_time_entry_validation() {
        let today = date("2024-06-10");
        let mut request = CreateTimeEntryRequest {
            task_id: 1,
            work: 2.0,
            work_date: date("2024-06-10"),
            person_id: None,
            note: None,
            activity_id: None,
        };
        assert!(request.validate(today).is_ok());

        request.work = 0.0;
        assert!(request.validate(today).is_err());

        request.work = 24.5;
        assert!(request.validate(today).is_err());

        request.work = 24.0;
        request.work_date = date("2024-06-11");
        let err = request.validate(today).unwrap_err();
        assert!(err.to_string().contains("future"));

        request.work_date = today;
        request.note = Some("x".repeat(1001));
        assert_eq!(
            request.validate(today).unwrap_err().code(),
            "LIQUIDPLANNER_TIME_ENTRY_ERROR"
        );
    }

    #[test]
    fn test_track_time_body() {
        let request = CreateTimeEntryRequest {
            task_id: 1,
            work: 1.25,
            work_date: date("2024-01-02"),
            person_id: Some(3),
            note: Some("review".to_string()),
            activity_id: None,
        };
        let body = request.to_track_time_body();
        assert_eq!(body["work_performed_on"], "2024-01-02");
        assert_eq!(body["member_id"], 3);
        assert!(body.get("activity_id").is_none());
    }

    #[test]
    fn test_create_task_validation() {
        let mut request = CreateTaskRequest {
            name: "Ship it".to_string(),
            parent_id: 10,
            description: None,
            assignments: None,
            custom_field_values: None,
            priority: Some(3),
        };
        assert!(request.validate().is_ok());

        request.name = "   ".to_string();
        assert!(request.validate().is_err());

        request.name = "ok".to_string();
        request.priority = Some(11);
        assert!(request.validate().is_err());

        request.priority = None;
        request.parent_id = 0;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_task_rejects_unknown_fields() {
        let updates = json!({ "name": "New", "velocity": 3 });
        let err = UpdateTaskRequest::from_updates(updates.as_object().unwrap()).unwrap_err();
        assert!(err.to_string().contains("velocity"));
    }

    #[test]
    fn test_update_task_renames_custom_fields() {
        let updates = json!({ "custom_fields": { "Billing": "X" }, "is_done": true });
        let request = UpdateTaskRequest::from_updates(updates.as_object().unwrap()).unwrap();
        assert!(request.fields.contains_key("custom_field_values"));
        assert_eq!(request.fields["is_done"], json!(true));
    }

    #[test]
    fn test_update_task_checks_types() {
        let updates = json!({ "promise_by": "next week" });
        assert!(UpdateTaskRequest::from_updates(updates.as_object().unwrap()).is_err());

        let updates = json!({});
        assert!(UpdateTaskRequest::from_updates(updates.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_filters_item_query_defaults_to_open_items() {
        let filters = Filters::default();
        assert_eq!(
            filters.item_query(),
            vec![("filter[]".to_string(), "is_done is false".to_string())]
        );

        let filters = Filters {
            include_done: Some(true),
            parent_id: Some(4),
            ..Default::default()
        };
        assert_eq!(
            filters.item_query(),
            vec![("filter[]".to_string(), "parent_id = 4".to_string())]
        );
    }

    #[test]
    fn test_filters_time_entry_matching() {
        let filters = Filters::from_value(Some(&json!({
            "start_date": "2024-01-01",
            "end_date": "2024-01-31",
            "task_id": 5
        })))
        .unwrap();

        let entry = TimeEntry {
            id: None,
            task_id: 5,
            task_name: None,
            person_id: Some(1),
            person_name: None,
            work: 1.0,
            work_date: date("2024-01-15"),
            note: None,
            activity_id: None,
        };
        assert!(filters.matches_time_entry(&entry));

        let outside = TimeEntry {
            work_date: date("2024-02-01"),
            ..entry
        };
        assert!(!filters.matches_time_entry(&outside));
    }

    #[test]
    fn test_member_matches() {
        let member = Member {
            id: 1,
            user_name: Some("jdoe".to_string()),
            email: Some("J.Doe@example.com".to_string()),
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
        };
        assert!(member.matches("jdoe"));
        assert!(member.matches("j.doe@example.com"));
        assert!(member.matches("Jane Doe"));
        assert!(!member.matches("john"));
    }

    #[test]
    fn test_custom_field_applies_to() {
        let field: CustomField = serde_json::from_value(json!({
            "id": 1, "name": "Billing", "type": "picklist", "item_type": "Task",
            "picklist_values": ["A", "B"]
        }))
        .unwrap();
        assert_eq!(field.field_type, "picklist");
        assert!(field.applies_to(ItemType::Task));
        assert!(!field.applies_to(ItemType::Project));
    }
}
