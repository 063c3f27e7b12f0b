// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! LiquidPlanner Module
//!
//! Upstream API access:
//! - `client`: authenticated, rate-limited, retrying HTTP client
//! - `models`: resource types and validated request payloads
//! - `error`: error taxonomy surfaced to MCP clients

pub mod client;
pub mod error;
pub mod models;

pub use client::LiquidPlannerClient;
pub use error::{ErrorPayload, LpError};
