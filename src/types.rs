//! Core data model: cell scalars, row records, sheets, and header mappings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{GradesheetError, Result};

/// A single cell value after ingestion.
///
/// Untagged on the wire: strings serialize as JSON strings, numbers as JSON
/// numbers, and empty cells as `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CellScalar {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellScalar {
    /// True for the empty cell value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Numeric view of the value, if it has one.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            Self::Empty => None,
        }
    }

    /// Text view of the value, if it is a string cell.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Display form: numbers use the shortest round-trip notation ("85",
    /// "90.5"), empty cells are the empty string.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::Empty => String::new(),
        }
    }
}

/// One extracted data row, keyed by the owning sheet's header labels.
///
/// Only the identifier/name/grade columns carry semantics; every other
/// column is opaque pass-through data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RowRecord(pub HashMap<String, CellScalar>);

impl RowRecord {
    /// Value under `column`, `Empty` if the column is absent.
    #[must_use]
    pub fn get(&self, column: &str) -> &CellScalar {
        static EMPTY: CellScalar = CellScalar::Empty;
        self.0.get(column).unwrap_or(&EMPTY)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: CellScalar) {
        self.0.insert(column.into(), value);
    }

    /// Schema-checked accessor: the student identifier under `mapping`.
    #[must_use]
    pub fn identifier(&self, mapping: &HeaderMapping) -> &CellScalar {
        self.get(&mapping.identifier_column)
    }

    /// Schema-checked accessor: the student name under `mapping`.
    #[must_use]
    pub fn name(&self, mapping: &HeaderMapping) -> &CellScalar {
        self.get(&mapping.name_column)
    }
}

/// One ingested worksheet. Immutable after ingestion; edits live in the
/// grade store, never here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub name: String,
    /// Column labels in original order. Blank header cells are synthesized
    /// as "Column N" (1-based) at ingestion time.
    pub headers: Vec<String>,
    pub rows: Vec<RowRecord>,
}

impl Sheet {
    /// A sheet that yielded no data rows (headers may still be known).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Mapping-slot selector for explicit user remapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MappingField {
    Identifier,
    Name,
    PrimaryGrade,
}

/// Resolved assignment of identifier/name/grade roles to column labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeaderMapping {
    pub identifier_column: String,
    pub name_column: String,
    pub primary_grade_column: String,
    /// Grade columns beyond the primary, in encounter order. Unique, and
    /// never equal to the identifier/name/primary columns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_grade_columns: Vec<String>,
}

impl HeaderMapping {
    /// All grade columns, primary first.
    pub fn grade_columns(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_grade_column.as_str())
            .chain(self.additional_grade_columns.iter().map(String::as_str))
    }

    /// True when `column` holds any mapped role.
    #[must_use]
    pub fn references(&self, column: &str) -> bool {
        self.identifier_column == column
            || self.name_column == column
            || self.grade_columns().any(|c| c == column)
    }

    /// Check that every referenced column exists in `headers`.
    #[must_use]
    pub fn resolves_in(&self, headers: &[String]) -> bool {
        let known = |c: &str| headers.iter().any(|h| h == c);
        known(&self.identifier_column)
            && known(&self.name_column)
            && self.grade_columns().all(known)
    }

    /// Reassign one mapping slot, preserving the uniqueness invariant.
    ///
    /// A column already holding a different role is rejected; remapping a
    /// slot to a column currently listed as an additional grade column
    /// removes it from that list.
    pub fn remap(&mut self, field: MappingField, column: &str) -> Result<()> {
        let taken = match field {
            MappingField::Identifier => {
                self.name_column == column || self.primary_grade_column == column
            }
            MappingField::Name => {
                self.identifier_column == column || self.primary_grade_column == column
            }
            MappingField::PrimaryGrade => {
                self.identifier_column == column || self.name_column == column
            }
        };
        if taken {
            return Err(GradesheetError::MappingIncomplete(format!(
                "column {column:?} already holds another role"
            )));
        }

        self.additional_grade_columns.retain(|c| c != column);
        match field {
            MappingField::Identifier => self.identifier_column = column.to_string(),
            MappingField::Name => self.name_column = column.to_string(),
            MappingField::PrimaryGrade => self.primary_grade_column = column.to_string(),
        }
        Ok(())
    }
}
