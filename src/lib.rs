// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! LiquidPlanner MCP server.
//!
//! Exposes LiquidPlanner time entries, tasks, projects and custom fields
//! as MCP tools over HTTP or stdio.

pub mod cache;
pub mod config;
pub mod export;
pub mod handlers;
pub mod health;
pub mod liquidplanner;
pub mod mcp;
pub mod metrics;
pub mod rate_limit;
pub mod timesheet;
