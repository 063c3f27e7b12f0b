// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! CSV time entry import.
//!
//! The first row is a header. Column names are matched case-insensitively
//! against a set of aliases; unknown columns are ignored.

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;

use crate::liquidplanner::models::{parse_date, CreateTimeEntryRequest, TimeEntry};
use crate::liquidplanner::LpError;

const TASK_ID: &[&str] = &["task_id", "task"];
const WORK: &[&str] = &["work", "hours"];
const WORK_DATE: &[&str] = &["work_date", "date"];
const PERSON_ID: &[&str] = &["person_id", "member_id"];
const PERSON: &[&str] = &["person", "person_name", "user"];
const NOTE: &[&str] = &["note", "notes", "comment"];
const ACTIVITY_ID: &[&str] = &["activity_id", "activity"];

/// A parsed row with its 1-based line in the CSV input.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedEntry {
    pub line: usize,
    pub entry: TimeEntry,
}

impl ImportedEntry {
    pub fn to_request(&self) -> CreateTimeEntryRequest {
        CreateTimeEntryRequest {
            task_id: self.entry.task_id,
            work: self.entry.work,
            work_date: self.entry.work_date,
            person_id: self.entry.person_id,
            note: self.entry.note.clone(),
            activity_id: self.entry.activity_id,
        }
    }
}

/// A row-level failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

impl RowError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ParsedCsv {
    pub rows: Vec<ImportedEntry>,
    pub errors: Vec<RowError>,
    /// Data rows read, including failed ones
    pub total_rows: usize,
}

/// Column positions resolved from the header.
struct Columns {
    task_id: usize,
    work: usize,
    work_date: usize,
    person_id: Option<usize>,
    person: Option<usize>,
    note: Option<usize>,
    activity_id: Option<usize>,
}

impl Columns {
    fn resolve(header: &StringRecord) -> Result<Self, LpError> {
        let names: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |aliases: &[&str]| names.iter().position(|n| aliases.contains(&n.as_str()));
        let require = |aliases: &[&str]| {
            find(aliases).ok_or_else(|| LpError::Csv {
                line: 1,
                message: format!("missing required column '{}'", aliases[0]),
            })
        };

        Ok(Self {
            task_id: require(TASK_ID)?,
            work: require(WORK)?,
            work_date: require(WORK_DATE)?,
            person_id: find(PERSON_ID),
            person: find(PERSON),
            note: find(NOTE),
            activity_id: find(ACTIVITY_ID),
        })
    }
}

fn cell<'a>(record: &'a StringRecord, idx: Option<usize>) -> Option<&'a str> {
    idx.and_then(|i| record.get(i)).filter(|s| !s.is_empty())
}

fn parse_id(
    record: &StringRecord,
    idx: Option<usize>,
    column: &str,
) -> Result<Option<u64>, String> {
    match cell(record, idx) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|_| format!("invalid {} '{}'", column, raw)),
    }
}

fn parse_row(record: &StringRecord, cols: &Columns) -> Result<TimeEntry, String> {
    let task_id = parse_id(record, Some(cols.task_id), "task_id")?
        .ok_or_else(|| "task_id is required".to_string())?;

    let work_raw = cell(record, Some(cols.work)).ok_or_else(|| "work is required".to_string())?;
    let work = work_raw
        .parse::<f64>()
        .map_err(|_| format!("invalid work '{}'", work_raw))?;

    let date_raw =
        cell(record, Some(cols.work_date)).ok_or_else(|| "work_date is required".to_string())?;
    let work_date = parse_date("work_date", date_raw).map_err(|e| e.to_string())?;

    Ok(TimeEntry {
        id: None,
        task_id,
        task_name: None,
        person_id: parse_id(record, cols.person_id, "person_id")?,
        person_name: cell(record, cols.person).map(str::to_string),
        work,
        work_date,
        note: cell(record, cols.note).map(str::to_string),
        activity_id: parse_id(record, cols.activity_id, "activity_id")?,
    })
}

/// Parse CSV text into time entries.
///
/// Structural problems (no header, missing required columns) fail the whole
/// import; bad rows are collected in `errors` with their line numbers.
pub fn parse_time_entries(data: &str) -> Result<ParsedCsv, LpError> {
    if data.trim().is_empty() {
        return Err(LpError::Csv {
            line: 1,
            message: "CSV data is empty".to_string(),
        });
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data.as_bytes());

    let header = reader
        .headers()
        .map_err(|e| LpError::Csv {
            line: 1,
            message: e.to_string(),
        })?
        .clone();
    let cols = Columns::resolve(&header)?;

    let mut parsed = ParsedCsv::default();
    for (idx, record) in reader.records().enumerate() {
        // header is line 1
        let fallback_line = idx + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback_line);
                parsed.total_rows += 1;
                parsed.errors.push(RowError::new(line, e.to_string()));
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }

        parsed.total_rows += 1;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_line);

        match parse_row(&record, &cols) {
            Ok(entry) => parsed.rows.push(ImportedEntry { line, entry }),
            Err(message) => parsed.errors.push(RowError::new(line, message)),
        }
    }

    Ok(parsed)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_aliases() {
        let data = "Task,Hours,Date,User,Comment\n\
                    100,2.5,2024-03-01,alice,standup\n\
                    101,1,2024-03-02,bob,\n";
        let parsed = parse_time_entries(data).unwrap();

        assert_eq!(parsed.total_rows, 2);
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows[0].line, 2);
        assert_eq!(parsed.rows[0].entry.task_id, 100);
        assert_eq!(parsed.rows[0].entry.work, 2.5);
        assert_eq!(parsed.rows[0].entry.person_name.as_deref(), Some("alice"));
        assert_eq!(parsed.rows[0].entry.note.as_deref(), Some("standup"));
        assert_eq!(parsed.rows[1].entry.note, None);
    }

    #[test]
    fn test_row_errors_carry_line_numbers() {
        let data = "task_id,work,work_date\n\
                    100,2,2024-03-01\n\
                    abc,2,2024-03-01\n\
                    101,2,03/01/2024\n";
        let parsed = parse_time_entries(data).unwrap();

        assert_eq!(parsed.total_rows, 3);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.errors.len(), 2);
        assert_eq!(parsed.errors[0].line, 3);
        assert!(parsed.errors[0].message.contains("task_id"));
        assert_eq!(parsed.errors[1].line, 4);
        assert!(parsed.errors[1].message.contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_missing_required_column() {
        let err = parse_time_entries("task_id,work\n1,2\n").unwrap_err();
        match err {
            LpError::Csv { line, message } => {
                assert_eq!(line, 1);
                assert!(message.contains("work_date"));
            }
            other => panic!("Expected CSV error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_time_entries("   \n").is_err());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let data = "task_id,work,work_date,member_id\n\
                    1,1,2024-01-01,9\n\
                    ,,,\n";
        let parsed = parse_time_entries(data).unwrap();
        assert_eq!(parsed.total_rows, 1);
        assert_eq!(parsed.rows[0].entry.person_id, Some(9));

        let request = parsed.rows[0].to_request();
        assert_eq!(request.person_id, Some(9));
        assert_eq!(request.task_id, 1);
    }
}
