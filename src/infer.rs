//! Structure inference: derive a [`HeaderMapping`] from a list of column
//! header strings.
//!
//! Three phases over the pattern registry, then positional fallbacks for any
//! slot still unassigned. Empty sheets (headers but no rows) get a distinct,
//! simpler path because there is no content to shape-match against.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{GradesheetError, Result};
use crate::grid::ScanConfig;
use crate::patterns::{classify, Category};
use crate::types::HeaderMapping;

lazy_static! {
    static ref PURELY_NUMERIC: Regex = numeric_regex();
}

#[allow(clippy::expect_used)]
fn numeric_regex() -> Regex {
    Regex::new(r"^\d+$").expect("numeric header pattern compiles")
}

// Placeholder labels spreadsheet tools leave in blank header cells.
const PLACEHOLDER_MARKERS: &[&str] = &["empty", "unnamed", "فارغ"];

/// Infer a mapping for a populated sheet's headers.
///
/// # Errors
/// `MappingIncomplete` when identifier, name, or primary grade cannot be
/// resolved after every fallback.
pub fn infer_mapping(headers: &[String], config: &ScanConfig) -> Result<HeaderMapping> {
    let mut slots = classify_headers(headers);
    apply_fallbacks(headers, config, &mut slots);
    slots.into_mapping(headers)
}

/// Infer a mapping for a header-only (empty) sheet.
///
/// Pattern phases run first; if none of identifier/name/grade resolve, the
/// assignment is purely positional (first, second, third, remainder).
/// Returns `None` when fewer than three headers exist and patterns resolved
/// nothing.
#[must_use]
pub fn infer_empty_sheet(headers: &[String]) -> Option<HeaderMapping> {
    let slots = classify_headers(headers);
    if slots.identifier.is_some() || slots.name.is_some() || slots.primary_grade.is_some() {
        let mut slots = slots;
        // Fill whatever the patterns left open positionally.
        positional_fill(headers, &mut slots);
        return slots.into_mapping(headers).ok();
    }

    if headers.len() < 3 {
        return None;
    }
    let mut slots = Slots::default();
    positional_fill(headers, &mut slots);
    slots.into_mapping(headers).ok()
}

/// Working assignment of header indices to mapping slots.
#[derive(Debug, Default)]
struct Slots {
    identifier: Option<usize>,
    name: Option<usize>,
    primary_grade: Option<usize>,
    additional_grades: Vec<usize>,
}

impl Slots {
    fn holds(&self, idx: usize) -> bool {
        self.identifier == Some(idx)
            || self.name == Some(idx)
            || self.primary_grade == Some(idx)
            || self.additional_grades.contains(&idx)
    }

    fn into_mapping(self, headers: &[String]) -> Result<HeaderMapping> {
        let label = |idx: Option<usize>, slot: &str| -> Result<String> {
            idx.and_then(|i| headers.get(i).cloned()).ok_or_else(|| {
                GradesheetError::MappingIncomplete(format!("no {slot} column resolved"))
            })
        };
        Ok(HeaderMapping {
            identifier_column: label(self.identifier, "identifier")?,
            name_column: label(self.name, "name")?,
            primary_grade_column: label(self.primary_grade, "primary grade")?,
            additional_grade_columns: self
                .additional_grades
                .iter()
                .filter_map(|&i| headers.get(i).cloned())
                .collect(),
        })
    }
}

/// Phases 1 and 2: first-match-wins identifier and name, then every grade
/// header in encounter order.
fn classify_headers(headers: &[String]) -> Slots {
    let mut slots = Slots::default();

    // Phase 1: identifier and name. Later matches in an assigned category
    // are ignored.
    for (idx, header) in headers.iter().enumerate() {
        match classify(header) {
            Some(Category::Identifier) if slots.identifier.is_none() => {
                slots.identifier = Some(idx);
            }
            Some(Category::Name) if slots.name.is_none() && slots.identifier != Some(idx) => {
                slots.name = Some(idx);
            }
            _ => {}
        }
    }

    // Phase 2: grade columns among the remaining headers, encounter order.
    for (idx, header) in headers.iter().enumerate() {
        if slots.identifier == Some(idx) || slots.name == Some(idx) {
            continue;
        }
        if classify(header) == Some(Category::Grade) {
            if slots.primary_grade.is_none() {
                slots.primary_grade = Some(idx);
            } else {
                slots.additional_grades.push(idx);
            }
        }
    }

    slots
}

/// Phase 3: content-shape and positional fallbacks for unassigned slots.
fn apply_fallbacks(headers: &[String], config: &ScanConfig, slots: &mut Slots) {
    if slots.identifier.is_none() {
        slots.identifier = headers
            .iter()
            .enumerate()
            .find(|(idx, h)| !slots.holds(*idx) && looks_like_identifier_label(h))
            .map(|(idx, _)| idx);
    }
    if slots.name.is_none() {
        slots.name = headers
            .iter()
            .enumerate()
            .find(|(idx, h)| !slots.holds(*idx) && contains_arabic_letter(h))
            .map(|(idx, _)| idx);
    }

    // Positional last resort: the earliest still-unassigned headers fill
    // identifier and name. Columns already holding a role stay put.
    if (slots.identifier.is_none() || slots.name.is_none()) && headers.len() >= 2 {
        let mut free = free_indices(headers, slots).into_iter();
        if slots.identifier.is_none() {
            slots.identifier = free.next();
        }
        if slots.name.is_none() {
            slots.name = free.next();
        }
    }

    // Positional grade fallback: the next unassigned header, remainder as
    // additional grades.
    if slots.primary_grade.is_none() && headers.len() >= config.min_grade_columns {
        let mut free = free_indices(headers, slots).into_iter();
        slots.primary_grade = free.next();
        slots.additional_grades = free.collect();
    }
}

/// Pure positional assignment used on the empty-sheet path.
fn positional_fill(headers: &[String], slots: &mut Slots) {
    let mut free = free_indices(headers, slots).into_iter();
    if slots.identifier.is_none() {
        slots.identifier = free.next();
    }
    if slots.name.is_none() {
        slots.name = free.next();
    }
    if slots.primary_grade.is_none() {
        slots.primary_grade = free.next();
    }
    if slots.additional_grades.is_empty() {
        slots.additional_grades = free.collect();
    }
}

fn free_indices(headers: &[String], slots: &Slots) -> Vec<usize> {
    (0..headers.len()).filter(|&i| !slots.holds(i)).collect()
}

fn looks_like_identifier_label(header: &str) -> bool {
    let trimmed = header.trim();
    PURELY_NUMERIC.is_match(trimmed)
        || PLACEHOLDER_MARKERS
            .iter()
            .any(|m| trimmed.to_lowercase().contains(m))
}

fn contains_arabic_letter(header: &str) -> bool {
    header.chars().any(|c| ('\u{0600}'..='\u{06FF}').contains(&c))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;

    fn headers(labels: &[&str]) -> Vec<String> {
        labels.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn arabic_headers_resolve_all_three_roles() {
        let h = headers(&["رقم الطالب", "اسم الطالب", "الدرجة النهائية"]);
        let m = infer_mapping(&h, &ScanConfig::default()).unwrap();
        assert_eq!(m.identifier_column, "رقم الطالب");
        assert_eq!(m.name_column, "اسم الطالب");
        assert_eq!(m.primary_grade_column, "الدرجة النهائية");
        assert!(m.additional_grade_columns.is_empty());
    }

    #[test]
    fn permutation_invariance_for_unambiguous_tokens() {
        let base = ["Student ID", "Student Name", "Final Grade"];
        let permutations = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for perm in permutations {
            let h: Vec<String> = perm.iter().map(|&i| base[i].to_string()).collect();
            let m = infer_mapping(&h, &ScanConfig::default()).unwrap();
            assert_eq!(m.identifier_column, "Student ID", "perm {perm:?}");
            assert_eq!(m.name_column, "Student Name", "perm {perm:?}");
            assert_eq!(m.primary_grade_column, "Final Grade", "perm {perm:?}");
        }
    }

    #[test]
    fn positional_fallback_with_four_unmatched_headers() {
        let h = headers(&["Column 1", "Column 2", "Column 3", "Column 4"]);
        let m = infer_mapping(&h, &ScanConfig::default()).unwrap();
        assert_eq!(m.identifier_column, "Column 1");
        assert_eq!(m.name_column, "Column 2");
        assert_eq!(m.primary_grade_column, "Column 3");
        assert_eq!(m.additional_grade_columns, vec!["Column 4".to_string()]);
    }

    #[test]
    fn multiple_grade_headers_collect_in_encounter_order() {
        let h = headers(&["ID", "Name", "Midterm Exam", "Final Grade", "Total"]);
        let m = infer_mapping(&h, &ScanConfig::default()).unwrap();
        assert_eq!(m.primary_grade_column, "Midterm Exam");
        assert_eq!(
            m.additional_grade_columns,
            vec!["Final Grade".to_string(), "Total".to_string()]
        );
    }

    #[test]
    fn arabic_letter_fallback_resolves_name() {
        // "الأسماء" carries no name token but is in the Arabic letter range.
        let h = headers(&["ID", "الأسماء", "Total"]);
        let m = infer_mapping(&h, &ScanConfig::default()).unwrap();
        assert_eq!(m.name_column, "الأسماء");
    }

    #[test]
    fn numeric_header_fallback_resolves_identifier() {
        let h = headers(&["12345", "Student Name", "Total"]);
        let m = infer_mapping(&h, &ScanConfig::default()).unwrap();
        assert_eq!(m.identifier_column, "12345");
    }

    #[test]
    fn positional_name_fallback_skips_assigned_columns() {
        // "Total" already holds the primary grade; the name fallback must
        // move on to the next unassigned header instead of doubling up.
        let h = headers(&["ID", "Total", "Notes"]);
        let m = infer_mapping(&h, &ScanConfig::default()).unwrap();
        assert_eq!(m.identifier_column, "ID");
        assert_eq!(m.name_column, "Notes");
        assert_eq!(m.primary_grade_column, "Total");
        assert_ne!(m.name_column, m.primary_grade_column);
    }

    #[test]
    fn two_headers_cannot_cover_three_roles() {
        // Identifier and grade consume both columns; nothing is left for the
        // name, so the mapping stays incomplete rather than reusing "Total".
        let h = headers(&["ID", "Total"]);
        assert!(matches!(
            infer_mapping(&h, &ScanConfig::default()),
            Err(GradesheetError::MappingIncomplete(_))
        ));
    }

    #[test]
    fn two_headers_cannot_resolve_a_grade() {
        let h = headers(&["Column 1", "Column 2"]);
        let err = infer_mapping(&h, &ScanConfig::default());
        assert!(matches!(
            err,
            Err(GradesheetError::MappingIncomplete(_))
        ));
    }

    #[test]
    fn grade_minimum_is_configurable() {
        let h = headers(&["Column 1", "Column 2"]);
        let loose = ScanConfig {
            min_grade_columns: 2,
            ..ScanConfig::default()
        };
        // Still unresolvable: only two headers, both consumed by id/name.
        assert!(infer_mapping(&h, &loose).is_err());
    }

    #[test]
    fn empty_sheet_uses_patterns_when_available() {
        let h = headers(&["رقم", "اسم", "درجة"]);
        let m = infer_empty_sheet(&h).unwrap();
        assert_eq!(m.identifier_column, "رقم");
        assert_eq!(m.primary_grade_column, "درجة");
    }

    #[test]
    fn empty_sheet_mixes_patterns_and_positions() {
        // Only the grade header classifies; identifier and name come from the
        // remaining columns in order.
        let h = headers(&["درجة", "A", "B"]);
        let m = infer_empty_sheet(&h).unwrap();
        assert_eq!(m.primary_grade_column, "درجة");
        assert_eq!(m.identifier_column, "A");
        assert_eq!(m.name_column, "B");
    }

    #[test]
    fn empty_sheet_falls_back_to_pure_positional() {
        let h = headers(&["A", "B", "C", "D"]);
        let m = infer_empty_sheet(&h).unwrap();
        assert_eq!(m.identifier_column, "A");
        assert_eq!(m.name_column, "B");
        assert_eq!(m.primary_grade_column, "C");
        assert_eq!(m.additional_grade_columns, vec!["D".to_string()]);
    }

    #[test]
    fn empty_sheet_with_too_few_headers_is_unresolved() {
        assert!(infer_empty_sheet(&headers(&["A", "B"])).is_none());
    }
}
