// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Timesheet Module
//!
//! Pure time-tracking logic used by the MCP tools:
//! - `import`: CSV parsing of time entries
//! - `dedup`: duplicate detection with user precedence
//! - `report`: timesheet and project status aggregation

pub mod dedup;
pub mod import;
pub mod report;

pub use dedup::{deduplicate, DeduplicationResult, DeduplicationRule};
pub use import::{parse_time_entries, ImportedEntry, RowError};
pub use report::{project_status, ProjectStatus, TimesheetSummary};
