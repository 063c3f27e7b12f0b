// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! MCP (Model Context Protocol) Module
//!
//! This module provides:
//! - Protocol types for the REST tool endpoints
//! - Tool registry with async trait and the LiquidPlanner tools
//! - rmcp server handler shared by stdio and `POST /mcp`
//! - HTTP handlers for /mcp and /mcp/tools/* endpoints

pub mod handlers;
pub mod protocol;
pub mod server;
pub mod tools;

pub use handlers::{mcp_router, McpState};
pub use protocol::*;
pub use server::{http_service, LiquidPlannerMcp, PROTOCOL_VERSION};
pub use tools::registry::ToolRegistry;
