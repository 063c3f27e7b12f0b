// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Argument parsing helpers shared by the tools.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::error;

use crate::liquidplanner::LpError;
use crate::mcp::protocol::ToolCallResponse;

pub type Args = HashMap<String, Value>;

pub const DEFAULT_LIMIT: usize = 100;
pub const MAX_LIMIT: usize = 1000;

fn present<'a>(args: &'a Args, key: &str) -> Option<&'a Value> {
    args.get(key).filter(|v| !v.is_null())
}

/// Integers may arrive as JSON numbers or numeric strings.
fn as_u64(v: &Value) -> Option<u64> {
    v.as_u64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

pub fn required_u64(args: &Args, key: &str) -> Result<u64, LpError> {
    let value = present(args, key)
        .ok_or_else(|| LpError::invalid_field(key, format!("Missing required argument: {}", key)))?;
    as_u64(value)
        .filter(|id| *id > 0)
        .ok_or_else(|| LpError::invalid_field(key, format!("{} must be a positive integer", key)))
}

pub fn optional_u64(args: &Args, key: &str) -> Result<Option<u64>, LpError> {
    present(args, key).map_or(Ok(None), |value| {
        as_u64(value)
            .filter(|id| *id > 0)
            .map(Some)
            .ok_or_else(|| {
                LpError::invalid_field(key, format!("{} must be a positive integer", key))
            })
    })
}

pub fn required_f64(args: &Args, key: &str) -> Result<f64, LpError> {
    let value = present(args, key)
        .ok_or_else(|| LpError::invalid_field(key, format!("Missing required argument: {}", key)))?;
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| LpError::invalid_field(key, format!("{} must be a number", key)))
}

pub fn required_str<'a>(args: &'a Args, key: &str) -> Result<&'a str, LpError> {
    present(args, key)
        .ok_or_else(|| LpError::invalid_field(key, format!("Missing required argument: {}", key)))?
        .as_str()
        .ok_or_else(|| LpError::invalid_field(key, format!("{} must be a string", key)))
}

pub fn optional_str(args: &Args, key: &str) -> Result<Option<String>, LpError> {
    present(args, key).map_or(Ok(None), |value| {
        value
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| LpError::invalid_field(key, format!("{} must be a string", key)))
    })
}

pub fn optional_bool(args: &Args, key: &str, default: bool) -> Result<bool, LpError> {
    present(args, key).map_or(Ok(default), |value| {
        value
            .as_bool()
            .ok_or_else(|| LpError::invalid_field(key, format!("{} must be a boolean", key)))
    })
}

pub fn optional_object(args: &Args, key: &str) -> Result<Option<Map<String, Value>>, LpError> {
    present(args, key).map_or(Ok(None), |value| {
        value
            .as_object()
            .cloned()
            .map(Some)
            .ok_or_else(|| LpError::invalid_field(key, format!("{} must be an object", key)))
    })
}

pub fn optional_array(args: &Args, key: &str) -> Result<Option<Vec<Value>>, LpError> {
    present(args, key).map_or(Ok(None), |value| {
        value
            .as_array()
            .cloned()
            .map(Some)
            .ok_or_else(|| LpError::invalid_field(key, format!("{} must be an array", key)))
    })
}

pub fn optional_id_list(args: &Args, key: &str) -> Result<Option<Vec<u64>>, LpError> {
    optional_array(args, key)?.map_or(Ok(None), |items| {
        items
            .iter()
            .map(|v| {
                as_u64(v).filter(|id| *id > 0).ok_or_else(|| {
                    LpError::invalid_field(key, format!("{} must contain positive integers", key))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    })
}

/// `limit` argument, 1..=1000, default 100.
pub fn limit(args: &Args) -> Result<usize, LpError> {
    match present(args, "limit") {
        None => Ok(DEFAULT_LIMIT),
        Some(value) => as_u64(value)
            .map(|n| n as usize)
            .filter(|n| (1..=MAX_LIMIT).contains(n))
            .ok_or_else(|| {
                LpError::invalid_field(
                    "limit",
                    format!("limit must be between 1 and {}", MAX_LIMIT),
                )
            }),
    }
}

/// Turn a tool result into a response, logging failures.
pub fn respond<T: Serialize>(tool: &str, result: Result<T, LpError>) -> ToolCallResponse {
    match result {
        Ok(data) => ToolCallResponse::json(&data).unwrap_or_else(|e| {
            ToolCallResponse::error(format!("Failed to serialize result: {}", e))
        }),
        Err(e) => {
            error!(tool = %tool, code = e.code(), error = %e, "Tool execution failed");
            ToolCallResponse::from_error(&e)
        }
    }
}
