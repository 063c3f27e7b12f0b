// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Custom field tools.
//!
//! Field keys may be given by name (case-insensitive) or numeric id. Values
//! are checked against the field type before anything is sent upstream.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::info;

use super::args::{self, Args};
use super::registry::{Tool, ToolContext};
use crate::liquidplanner::models::{parse_date, CustomField, ItemType};
use crate::liquidplanner::{LiquidPlannerClient, LpError};
use crate::mcp::protocol::ToolCallResponse;

const ITEM_TYPE_SCHEMA: &str = "Type of item: 'task', 'project', 'folder', 'package'";

// =============================================================================
// Resolution and validation
// =============================================================================

/// Enabled definitions that apply to `item_type`.
pub(crate) async fn definitions_for(
    client: &LiquidPlannerClient,
    item_type: ItemType,
) -> Result<Vec<CustomField>, LpError> {
    Ok(client
        .list_custom_fields()
        .await?
        .into_iter()
        .filter(|f| f.is_enabled && f.applies_to(item_type))
        .collect())
}

fn find_field<'a>(defs: &'a [CustomField], key: &str) -> Option<&'a CustomField> {
    if let Ok(id) = key.trim().parse::<u64>() {
        if let Some(field) = defs.iter().find(|f| f.id == id) {
            return Some(field);
        }
    }
    let needle = key.trim().to_lowercase();
    defs.iter().find(|f| f.name.to_lowercase() == needle)
}

fn coerce(field: &CustomField, value: &Value) -> Result<Value, LpError> {
    let fail = |message: String| LpError::CustomField {
        field: field.name.clone(),
        message,
    };

    if value.is_null() {
        if field.is_required {
            return Err(fail("field is required and cannot be cleared".to_string()));
        }
        return Ok(Value::Null);
    }

    match field.field_type.to_lowercase().as_str() {
        "number" | "numeric" | "integer" | "currency" => {
            value
                .as_f64()
                .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| fail(format!("expected a finite number, got {}", value)))
        }
        "date" => {
            let text = value
                .as_str()
                .ok_or_else(|| fail(format!("expected a date string, got {}", value)))?;
            parse_date(&field.name, text)
                .map(|d| Value::from(d.to_string()))
                .map_err(|_| fail(format!("invalid date '{}', expected YYYY-MM-DD", text)))
        }
        "checkbox" | "boolean" => match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            other => Err(fail(format!("expected true or false, got {}", other))),
        },
        "picklist" | "dropdown" => {
            let text = value.as_str().ok_or_else(|| {
                fail(format!("expected one of the picklist values, got {}", value))
            })?;
            let options = field.picklist_values.as_deref().unwrap_or_default();
            options
                .iter()
                .find(|o| o.eq_ignore_ascii_case(text.trim()))
                .map(|o| Value::from(o.clone()))
                .ok_or_else(|| {
                    fail(format!(
                        "'{}' is not a valid option. Allowed: {}",
                        text,
                        options.join(", ")
                    ))
                })
        }
        "text" | "string" | "textarea" => value
            .as_str()
            .map(|s| Value::from(s.to_string()))
            .ok_or_else(|| fail(format!("expected text, got {}", value))),
        _ => Ok(value.clone()),
    }
}

/// Map user-supplied keys to canonical field names with validated values.
pub(crate) fn resolve_custom_fields(
    defs: &[CustomField],
    updates: &Map<String, Value>,
) -> Result<Map<String, Value>, LpError> {
    if updates.is_empty() {
        return Err(LpError::invalid_field(
            "custom_fields",
            "No custom fields to update",
        ));
    }

    let mut resolved = Map::new();
    for (key, value) in updates {
        let field = find_field(defs, key).ok_or_else(|| LpError::CustomField {
            field: key.clone(),
            message: "unknown custom field for this item type".to_string(),
        })?;
        resolved.insert(field.name.clone(), coerce(field, value)?);
    }
    Ok(resolved)
}

/// Resolve custom fields for a create/update payload, if any were given.
pub(crate) async fn resolve_optional(
    client: &LiquidPlannerClient,
    item_type: ItemType,
    custom_fields: Option<Map<String, Value>>,
) -> Result<Option<Map<String, Value>>, LpError> {
    match custom_fields {
        None => Ok(None),
        Some(map) if map.is_empty() => Ok(None),
        Some(map) => {
            let defs = definitions_for(client, item_type).await?;
            resolve_custom_fields(&defs, &map).map(Some)
        }
    }
}

// =============================================================================
// list_custom_fields
// =============================================================================

pub struct ListCustomFieldsTool {
    client: Arc<LiquidPlannerClient>,
}

impl ListCustomFieldsTool {
    pub fn new(client: Arc<LiquidPlannerClient>) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> Result<Value, LpError> {
        let item_type = ItemType::parse(args::required_str(args, "item_type")?)?;
        let fields = definitions_for(&self.client, item_type).await?;
        Ok(json!({
            "item_type": item_type,
            "total_count": fields.len(),
            "custom_fields": fields,
        }))
    }
}

#[async_trait]
impl Tool for ListCustomFieldsTool {
    fn name(&self) -> &str {
        "list_custom_fields"
    }

    fn description(&self) -> &str {
        "List all available custom fields for a specific item type."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "item_type": {
                    "type": "string",
                    "enum": ["task", "project", "folder", "package"],
                    "description": ITEM_TYPE_SCHEMA
                }
            },
            "required": ["item_type"]
        })
    }

    async fn execute(&self, args: Args, _ctx: ToolContext) -> ToolCallResponse {
        args::respond(self.name(), self.run(&args).await)
    }
}

// =============================================================================
// get_custom_field_values
// =============================================================================

pub struct GetCustomFieldValuesTool {
    client: Arc<LiquidPlannerClient>,
}

impl GetCustomFieldValuesTool {
    pub fn new(client: Arc<LiquidPlannerClient>) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> Result<Map<String, Value>, LpError> {
        let item_id = args::required_u64(args, "item_id")?;
        let item_type = ItemType::parse(args::required_str(args, "item_type")?)?;

        let item = self.client.get_item(item_type, item_id).await?;
        let defs = self.client.list_custom_fields().await?;

        let mut values = Map::new();
        if let Some(raw) = item.get("custom_field_values").and_then(Value::as_object) {
            for (key, value) in raw {
                let name = find_field(&defs, key)
                    .map(|f| f.name.clone())
                    .unwrap_or_else(|| key.clone());
                values.insert(name, value.clone());
            }
        }
        Ok(values)
    }
}

#[async_trait]
impl Tool for GetCustomFieldValuesTool {
    fn name(&self) -> &str {
        "get_custom_field_values"
    }

    fn description(&self) -> &str {
        "Get all custom field values for a specific item."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "item_id": {
                    "type": "integer",
                    "description": "ID of the item to get custom field values for"
                },
                "item_type": {
                    "type": "string",
                    "enum": ["task", "project", "folder", "package"],
                    "description": ITEM_TYPE_SCHEMA
                }
            },
            "required": ["item_id", "item_type"]
        })
    }

    async fn execute(&self, args: Args, _ctx: ToolContext) -> ToolCallResponse {
        args::respond(self.name(), self.run(&args).await)
    }
}

// =============================================================================
// update_custom_fields
// =============================================================================

pub struct UpdateCustomFieldsTool {
    client: Arc<LiquidPlannerClient>,
}

impl UpdateCustomFieldsTool {
    pub fn new(client: Arc<LiquidPlannerClient>) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> Result<Value, LpError> {
        let item_id = args::required_u64(args, "item_id")?;
        let item_type = ItemType::parse(args::required_str(args, "item_type")?)?;
        let updates = args::optional_object(args, "custom_fields")?.ok_or_else(|| {
            LpError::invalid_field("custom_fields", "Missing required argument: custom_fields")
        })?;

        let defs = definitions_for(&self.client, item_type).await?;
        let resolved = resolve_custom_fields(&defs, &updates)?;
        let updated_fields: Vec<String> = resolved.keys().cloned().collect();

        let item = self
            .client
            .update_item(item_type, item_id, json!({ "custom_field_values": resolved }))
            .await?;

        info!(
            item_id,
            item_type = %item_type,
            fields = updated_fields.len(),
            "Custom fields updated"
        );

        Ok(json!({
            "success": true,
            "item_id": item_id,
            "item_type": item_type,
            "updated_fields": updated_fields,
            "item": item,
        }))
    }
}

#[async_trait]
impl Tool for UpdateCustomFieldsTool {
    fn name(&self) -> &str {
        "update_custom_fields"
    }

    fn description(&self) -> &str {
        "Update custom field values for an item. Supports field names and field IDs."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "item_id": {
                    "type": "integer",
                    "description": "ID of the item to update"
                },
                "item_type": {
                    "type": "string",
                    "enum": ["task", "project", "folder", "package"],
                    "description": ITEM_TYPE_SCHEMA
                },
                "custom_fields": {
                    "type": "object",
                    "description": "Custom fields to update (field name/ID -> value)"
                }
            },
            "required": ["item_id", "item_type", "custom_fields"]
        })
    }

    async fn execute(&self, args: Args, _ctx: ToolContext) -> ToolCallResponse {
        args::respond(self.name(), self.run(&args).await)
    }
}

// =============================================================================
// Tests
// =============================================================================
