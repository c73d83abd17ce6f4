//! In-memory grade store.
//!
//! Keyed student-identifier → column → value. Seeded from ingested rows,
//! mutated only through validated commits (or history replay, which writes
//! already-validated values back).

use std::collections::HashMap;

use crate::error::{GradesheetError, Result};
use crate::persist::KeyValueStore;
use crate::types::{CellScalar, HeaderMapping, Sheet};

type GradeMap = HashMap<String, HashMap<String, CellScalar>>;

/// Current grade values for one session.
#[derive(Debug, Default)]
pub struct GradeStore {
    grades: GradeMap,
}

impl GradeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from a sheet's rows under `mapping`, replacing any
    /// previous contents.
    pub fn seed(&mut self, sheet: &Sheet, mapping: &HeaderMapping) {
        self.grades.clear();
        for row in &sheet.rows {
            let id = row.identifier(mapping).display();
            if id.is_empty() {
                continue;
            }
            let cells = self.grades.entry(id).or_default();
            for column in mapping.grade_columns() {
                cells.insert(column.to_string(), row.get(column).clone());
            }
        }
    }

    /// Overlay prior persisted edits; the persisted value wins per key.
    /// Only identifiers the seed produced are merged, so stale entries for
    /// students no longer on the sheet do not resurface. A payload that
    /// fails to deserialize is treated as absent.
    pub fn merge_persisted(&mut self, port: &dyn KeyValueStore, key: &str) {
        let Some(payload) = port.get(key) else {
            return;
        };
        let Ok(persisted) = serde_json::from_str::<GradeMap>(&payload) else {
            log::warn!("persisted grades under {key:?} unreadable, ignoring");
            return;
        };
        for (student, cells) in persisted {
            let Some(entry) = self.grades.get_mut(&student) else {
                continue;
            };
            for (column, value) in cells {
                entry.insert(column, value);
            }
        }
    }

    /// Persist the full store under `key` (last-write-wins).
    pub fn save(&self, port: &mut dyn KeyValueStore, key: &str) {
        match serde_json::to_string(&self.grades) {
            Ok(json) => port.set(key, &json),
            Err(e) => log::warn!("grade store serialization failed: {e}"),
        }
    }

    /// Validate and apply one edit.
    ///
    /// Empty text clears the cell; otherwise the text must parse as a
    /// floating-point number.
    ///
    /// # Errors
    /// `Validation` for non-numeric, non-empty text; the store is untouched.
    pub fn commit(&mut self, student_id: &str, column: &str, raw: &str) -> Result<CellScalar> {
        let value = parse_grade(raw)?;
        self.set(student_id, column, value.clone());
        Ok(value)
    }

    /// Write a value without validation (history replay path).
    pub fn set(&mut self, student_id: &str, column: &str, value: CellScalar) {
        self.grades
            .entry(student_id.to_string())
            .or_default()
            .insert(column.to_string(), value);
    }

    /// Current value for a cell, if the store tracks it.
    #[must_use]
    pub fn get(&self, student_id: &str, column: &str) -> Option<&CellScalar> {
        self.grades.get(student_id).and_then(|c| c.get(column))
    }

    /// True when a student identifier is known to the store.
    #[must_use]
    pub fn contains_student(&self, student_id: &str) -> bool {
        self.grades.contains_key(student_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grades.is_empty()
    }

    /// Drop everything (explicit session reset).
    pub fn clear(&mut self) {
        self.grades.clear();
    }
}

/// Grade text validation: empty clears, numeric text parses, anything else
/// is rejected.
fn parse_grade(raw: &str) -> Result<CellScalar> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(CellScalar::Empty);
    }
    trimmed
        .parse::<f64>()
        .map(CellScalar::Number)
        .map_err(|_| GradesheetError::Validation(format!("not a number: {trimmed:?}")))
}
