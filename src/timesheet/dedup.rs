// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Time entry deduplication.
//!
//! Two entries are duplicates when they target the same task on the same day
//! and their hours differ by at most `duplicate_threshold_hours`. Within a
//! duplicate group one entry survives, chosen by user precedence.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::import::ImportedEntry;
use crate::liquidplanner::models::TimeEntry;
use crate::liquidplanner::LpError;

// =============================================================================
// Rules
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeduplicationRule {
    pub enabled: bool,
    /// Persons in precedence order; earlier wins
    pub precedence_users: Vec<String>,
    /// Drop the losing entries of a group
    pub skip_duplicates: bool,
    /// Fold the notes of losing entries into the kept one
    pub merge_duplicates: bool,
    pub duplicate_threshold_hours: f64,
}

impl Default for DeduplicationRule {
    fn default() -> Self {
        Self {
            enabled: true,
            precedence_users: Vec::new(),
            skip_duplicates: true,
            merge_duplicates: false,
            duplicate_threshold_hours: 0.01,
        }
    }
}

impl DeduplicationRule {
    /// Parse tool arguments on top of configured defaults.
    ///
    /// Keys absent from `value` keep the values of `base`.
    pub fn from_value(value: Option<&Value>, base: &DeduplicationRule) -> Result<Self, LpError> {
        let overrides = match value {
            None | Some(Value::Null) => return Ok(base.clone()),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => {
                return Err(LpError::invalid_field(
                    "deduplication_rules",
                    "deduplication_rules must be an object",
                ))
            }
        };

        let mut merged = match serde_json::to_value(base) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        merged.extend(overrides);

        let rule: DeduplicationRule = serde_json::from_value(Value::Object(merged)).map_err(|e| {
            LpError::invalid_field(
                "deduplication_rules",
                format!("Invalid deduplication rules: {}", e),
            )
        })?;

        if !(rule.duplicate_threshold_hours >= 0.0) {
            return Err(LpError::invalid_field(
                "duplicate_threshold_hours",
                "duplicate_threshold_hours must be >= 0",
            ));
        }
        Ok(rule)
    }

    /// Precedence rank of a person; unlisted persons rank after every listed one.
    fn rank(&self, entry: &TimeEntry) -> usize {
        let candidates = [
            entry.person_name.as_deref().map(str::to_lowercase),
            entry.person_id.map(|id| id.to_string()),
        ];
        self.precedence_users
            .iter()
            .position(|user| {
                let user = user.trim().to_lowercase();
                candidates.iter().flatten().any(|c| *c == user)
            })
            .unwrap_or(self.precedence_users.len())
    }

    fn is_duplicate(&self, a: &TimeEntry, b: &TimeEntry) -> bool {
        a.task_id == b.task_id
            && a.work_date == b.work_date
            && (a.work - b.work).abs() <= self.duplicate_threshold_hours + f64::EPSILON
    }
}

// =============================================================================
// Result
// =============================================================================

/// A dropped or merged entry, reported back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateEntry {
    pub line: usize,
    pub task_id: u64,
    pub work_date: NaiveDate,
    pub work: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person: Option<String>,
    /// `merged`, `skipped` or `already_exists`
    pub resolution: &'static str,
    /// Line of the entry that was kept, for in-batch duplicates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kept_line: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeduplicationResult {
    #[serde(skip)]
    pub entries: Vec<ImportedEntry>,
    pub original_count: usize,
    pub deduplicated_count: usize,
    pub duplicates_found: usize,
    pub duplicates_merged: usize,
    pub duplicates_skipped: usize,
    pub duplicate_entries: Vec<DuplicateEntry>,
}

fn report(
    entry: &ImportedEntry,
    resolution: &'static str,
    kept_line: Option<usize>,
) -> DuplicateEntry {
    DuplicateEntry {
        line: entry.line,
        task_id: entry.entry.task_id,
        work_date: entry.entry.work_date,
        work: entry.entry.work,
        person: entry.entry.person_key(),
        resolution,
        kept_line,
    }
}

// =============================================================================
// Deduplication
// =============================================================================

/// Remove duplicates from `entries` and drop entries already present upstream.
///
/// Surviving entries keep their input order.
pub fn deduplicate(
    entries: Vec<ImportedEntry>,
    existing: &[TimeEntry],
    rule: &DeduplicationRule,
) -> DeduplicationResult {
    let original_count = entries.len();
    if !rule.enabled {
        return DeduplicationResult {
            deduplicated_count: original_count,
            original_count,
            entries,
            ..Default::default()
        };
    }

    let mut result = DeduplicationResult {
        original_count,
        ..Default::default()
    };

    // Cluster by duplicate relation against each cluster's first member.
    let mut clusters: Vec<Vec<usize>> = Vec::new();
    for (idx, item) in entries.iter().enumerate() {
        let found = clusters
            .iter_mut()
            .find(|c| rule.is_duplicate(&entries[c[0]].entry, &item.entry));
        match found {
            Some(cluster) => cluster.push(idx),
            None => clusters.push(vec![idx]),
        }
    }

    let mut keep = vec![false; entries.len()];
    let mut merged_notes: Vec<Option<String>> = vec![None; entries.len()];

    for cluster in &clusters {
        // min_by_key returns the first minimum, so ties keep input order
        let winner = cluster
            .iter()
            .copied()
            .min_by_key(|&i| rule.rank(&entries[i].entry))
            .unwrap_or(cluster[0]);
        keep[winner] = true;

        if cluster.len() == 1 {
            continue;
        }
        result.duplicates_found += cluster.len() - 1;

        if rule.merge_duplicates {
            let mut notes: Vec<String> = Vec::new();
            let others = cluster.iter().copied().filter(|&i| i != winner);
            let ordered = std::iter::once(winner).chain(others);
            for i in ordered {
                if let Some(note) = entries[i].entry.note.as_deref().map(str::trim) {
                    if !note.is_empty() && !notes.iter().any(|n| n == note) {
                        notes.push(note.to_string());
                    }
                }
            }
            if !notes.is_empty() {
                merged_notes[winner] = Some(notes.join("; "));
            }
            for &i in cluster.iter().filter(|&&i| i != winner) {
                result.duplicates_merged += 1;
                result
                    .duplicate_entries
                    .push(report(&entries[i], "merged", Some(entries[winner].line)));
            }
        } else if rule.skip_duplicates {
            for &i in cluster.iter().filter(|&&i| i != winner) {
                result.duplicates_skipped += 1;
                result
                    .duplicate_entries
                    .push(report(&entries[i], "skipped", Some(entries[winner].line)));
            }
        } else {
            for &i in cluster {
                keep[i] = true;
            }
        }
    }

    for (idx, mut item) in entries.into_iter().enumerate() {
        if !keep[idx] {
            continue;
        }
        let already_exists = existing.iter().any(|e| rule.is_duplicate(e, &item.entry));
        if already_exists {
            result.duplicates_found += 1;
            result.duplicates_skipped += 1;
            result
                .duplicate_entries
                .push(report(&item, "already_exists", None));
            continue;
        }
        if let Some(note) = merged_notes[idx].take() {
            item.entry.note = Some(note);
        }
        result.entries.push(item);
    }

    result.deduplicated_count = result.entries.len();
    result
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(
        line: usize,
        task_id: u64,
        work: f64,
        date: &str,
        person: &str,
        note: Option<&str>,
    ) -> ImportedEntry {
        ImportedEntry {
            line,
            entry: TimeEntry {
                id: None,
                task_id,
                task_name: None,
                person_id: None,
                person_name: Some(person.to_string()),
                work,
                work_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                note: note.map(str::to_string),
                activity_id: None,
            },
        }
    }

    #[test]
    fn test_default_rule() {
        let rule = DeduplicationRule::default();
        assert!(rule.enabled);
        assert!(rule.skip_duplicates);
        assert!(!rule.merge_duplicates);
        assert_eq!(rule.duplicate_threshold_hours, 0.01);
    }

    #[test]
    fn test_rule_overrides_keep_base() {
        let base = DeduplicationRule {
            precedence_users: vec!["alice".to_string()],
            ..Default::default()
        };
        let overrides = json!({ "merge_duplicates": true });
        let rule = DeduplicationRule::from_value(Some(&overrides), &base).unwrap();
        assert!(rule.merge_duplicates);
        assert_eq!(rule.precedence_users, vec!["alice"]);

        assert!(DeduplicationRule::from_value(Some(&json!([1])), &base).is_err());
        assert!(DeduplicationRule::from_value(
            Some(&json!({ "duplicate_threshold_hours": -1.0 })),
            &base
        )
        .is_err());
    }

    #[test]
    fn test_precedence_picks_listed_user() {
        let rule = DeduplicationRule {
            precedence_users: vec!["Bob".to_string(), "alice".to_string()],
            ..Default::default()
        };
        let entries = vec![
            entry(2, 1, 2.0, "2024-01-01", "alice", None),
            entry(3, 1, 2.0, "2024-01-01", "carol", None),
            entry(4, 1, 2.005, "2024-01-01", "bob", None),
        ];

        let result = deduplicate(entries, &[], &rule);
        assert_eq!(result.deduplicated_count, 1);
        assert_eq!(result.entries[0].line, 4);
        assert_eq!(result.duplicates_found, 2);
        assert_eq!(result.duplicates_skipped, 2);
        assert!(result
            .duplicate_entries
            .iter()
            .all(|d| d.kept_line == Some(4)));
    }

    #[test]
    fn test_tie_keeps_first() {
        let rule = DeduplicationRule::default();
        let entries = vec![
            entry(2, 1, 1.0, "2024-01-01", "x", None),
            entry(3, 1, 1.0, "2024-01-01", "y", None),
        ];
        let result = deduplicate(entries, &[], &rule);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].line, 2);
    }

    #[test]
    fn test_threshold_separates_entries() {
        let rule = DeduplicationRule::default();
        let entries = vec![
            entry(2, 1, 1.0, "2024-01-01", "x", None),
            entry(3, 1, 1.5, "2024-01-01", "x", None),
            entry(4, 1, 1.0, "2024-01-02", "x", None),
            entry(5, 2, 1.0, "2024-01-01", "x", None),
        ];
        let result = deduplicate(entries, &[], &rule);
        assert_eq!(result.deduplicated_count, 4);
        assert_eq!(result.duplicates_found, 0);
    }

    #[test]
    fn test_merge_notes() {
        let rule = DeduplicationRule {
            merge_duplicates: true,
            ..Default::default()
        };
        let entries = vec![
            entry(2, 1, 3.0, "2024-01-01", "x", Some("design")),
            entry(3, 1, 3.0, "2024-01-01", "y", Some("review")),
            entry(4, 1, 3.0, "2024-01-01", "z", Some("design")),
        ];
        let result = deduplicate(entries, &[], &rule);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].entry.note.as_deref(), Some("design; review"));
        assert_eq!(result.duplicates_merged, 2);
        assert_eq!(result.duplicates_skipped, 0);
    }

    #[test]
    fn test_keep_all_when_neither_skip_nor_merge() {
        let rule = DeduplicationRule {
            skip_duplicates: false,
            ..Default::default()
        };
        let entries = vec![
            entry(2, 1, 3.0, "2024-01-01", "x", None),
            entry(3, 1, 3.0, "2024-01-01", "y", None),
        ];
        let result = deduplicate(entries, &[], &rule);
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.duplicates_found, 1);
    }

    #[test]
    fn test_existing_entries_are_skipped() {
        let rule = DeduplicationRule::default();
        let existing = vec![entry(0, 1, 2.0, "2024-01-01", "x", None).entry];
        let entries = vec![
            entry(2, 1, 2.0, "2024-01-01", "x", None),
            entry(3, 1, 4.0, "2024-01-01", "x", None),
        ];
        let result = deduplicate(entries, &existing, &rule);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].line, 3);
        assert_eq!(result.duplicate_entries[0].resolution, "already_exists");
    }

    #[test]
    fn test_existing_entry_from_another_person_is_duplicate() {
        let rule = DeduplicationRule::default();
        let mut upstream = entry(0, 1, 2.0, "2024-01-01", "x", None).entry;
        upstream.person_id = Some(10);
        let mut imported = entry(2, 1, 2.0, "2024-01-01", "y", None);
        imported.entry.person_id = Some(20);

        let against_upstream = deduplicate(vec![imported.clone()], &[upstream.clone()], &rule);
        assert_eq!(against_upstream.deduplicated_count, 0);
        assert_eq!(against_upstream.duplicates_found, 1);

        let as_upstream_row = ImportedEntry {
            line: 3,
            entry: upstream,
        };
        let in_batch = deduplicate(vec![imported, as_upstream_row], &[], &rule);
        assert_eq!(in_batch.deduplicated_count, 1);
        assert_eq!(in_batch.duplicates_found, 1);
    }

    #[test]
    fn test_disabled_passes_through() {
        let rule = DeduplicationRule {
            enabled: false,
            ..Default::default()
        };
        let entries = vec![
            entry(2, 1, 2.0, "2024-01-01", "x", None),
            entry(3, 1, 2.0, "2024-01-01", "x", None),
        ];
        let result = deduplicate(entries, &[], &rule);
        assert_eq!(result.original_count, 2);
        assert_eq!(result.deduplicated_count, 2);
        assert_eq!(result.duplicates_found, 0);
    }
}
