//! Grid scanning: locate the header row and identifier/name columns inside a
//! raw, sparsely-populated cell grid.
//!
//! Two layered heuristics, tried in order:
//! 1. Row scan — score every row by its count of identifier/name keyword
//!    cells and keep the best-scoring row (count desc, row index asc; ties
//!    keep the first row encountered).
//! 2. Content-shape fallback — find a large numeric cell (id-shaped) next to
//!    a text cell with internal whitespace (name-shaped) and treat the row
//!    above as the header row.
//!
//! Both failing, the caller must expose every original column with no row
//! filtering.

use crate::patterns::{matches_header_keyword, matches_identifier_keyword, matches_name_keyword};
use crate::types::CellScalar;

/// Tunable thresholds for structure detection.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Numeric values above this look like student identifiers rather than
    /// grades in the content-shape fallback.
    pub id_magnitude_threshold: f64,
    /// Minimum header count before the positional grade fallback assigns the
    /// third column as the primary grade.
    pub min_grade_columns: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            id_magnitude_threshold: 1000.0,
            min_grade_columns: 3,
        }
    }
}

/// Outcome of a successful grid scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridScan {
    /// Index of the header row. `None` when the shape fallback matched on
    /// the first grid row, leaving no room for a header above it; header
    /// labels are then synthesized positionally downstream.
    pub header_row: Option<usize>,
    pub identifier_col: usize,
    pub name_col: usize,
}

impl GridScan {
    /// First grid row holding data rather than labels.
    #[must_use]
    pub fn data_start(&self) -> usize {
        self.header_row.map_or(0, |h| h + 1)
    }
}

/// Scan a row-major grid for a header row and identifier/name column pair.
pub fn scan_grid(grid: &[Vec<CellScalar>], config: &ScanConfig) -> Option<GridScan> {
    scan_by_keywords(grid).or_else(|| scan_by_shape(grid, config))
}

/// Row scan: single forward pass tracking the strictly-best keyword count.
/// A tie on the count keeps the earlier row.
fn scan_by_keywords(grid: &[Vec<CellScalar>]) -> Option<GridScan> {
    let mut best: Option<(usize, usize)> = None; // (count, row)

    for (row_idx, row) in grid.iter().enumerate() {
        let count = row
            .iter()
            .filter(|cell| {
                cell.as_text()
                    .is_some_and(matches_header_keyword)
            })
            .count();
        if count > 0 && best.map_or(true, |(best_count, _)| count > best_count) {
            best = Some((count, row_idx));
        }
    }

    let (_, header_row) = best?;
    let row = grid.get(header_row)?;

    let identifier_col = row
        .iter()
        .position(|cell| cell.as_text().is_some_and(matches_identifier_keyword))
        .unwrap_or(0);
    let name_col = row
        .iter()
        .enumerate()
        .position(|(idx, cell)| {
            idx != identifier_col && cell.as_text().is_some_and(matches_name_keyword)
        })
        .unwrap_or(identifier_col + 1);

    Some(GridScan {
        header_row: Some(header_row),
        identifier_col,
        name_col,
    })
}

/// Content-shape fallback: an id-magnitude number adjacent to a full-name
/// string marks a data row; the row above it is taken as the header row.
fn scan_by_shape(grid: &[Vec<CellScalar>], config: &ScanConfig) -> Option<GridScan> {
    for (row_idx, row) in grid.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let CellScalar::Number(n) = cell else {
                continue;
            };
            if *n <= config.id_magnitude_threshold {
                continue;
            }
            // Prefer the column to the right, then the left.
            let neighbor = [col_idx + 1, col_idx.wrapping_sub(1)]
                .into_iter()
                .find(|&c| row.get(c).is_some_and(looks_like_full_name));
            if let Some(name_col) = neighbor {
                return Some(GridScan {
                    header_row: row_idx.checked_sub(1),
                    identifier_col: col_idx,
                    name_col,
                });
            }
        }
    }
    None
}

/// A string with internal whitespace is our proxy for a full name.
fn looks_like_full_name(cell: &CellScalar) -> bool {
    cell.as_text()
        .is_some_and(|s| s.trim().contains(char::is_whitespace))
}
