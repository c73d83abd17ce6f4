//! Workbook ingestion.
//!
//! Orchestrates the container walk, per-sheet grid scanning, header and row
//! extraction, and the final structure-inference pass across sheets. An
//! ingestion either completes or fails atomically; no partial workbook state
//! escapes.

mod workbook;
mod worksheet;

use std::collections::HashMap;
use std::io::Cursor;
use zip::ZipArchive;

use crate::error::{GradesheetError, Result};
use crate::grid::{scan_grid, GridScan, ScanConfig};
use crate::infer::{infer_empty_sheet, infer_mapping};
use crate::types::{CellScalar, HeaderMapping, RowRecord, Sheet};

use workbook::{get_sheet_info, parse_shared_strings, parse_workbook_relationships};
use worksheet::parse_grid;

/// Accepted workbook extensions (legacy and modern container variants).
const ACCEPTED_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// Result of a successful workbook ingestion.
#[derive(Debug)]
pub struct Ingested {
    /// All sheets, including those that yielded zero rows.
    pub sheets: Vec<Sheet>,
    /// Index of the initially selected sheet: the first non-empty sheet, or
    /// the first sheet when all are empty.
    pub current_sheet: usize,
    /// Reference mapping inferred from the first non-empty sheet's headers.
    /// `None` when the fallback chain could not resolve all three roles;
    /// sheets stay inspectable and confirmation is blocked downstream.
    pub mapping: Option<HeaderMapping>,
    /// Mappings derived for header-only sheets, keyed by sheet name.
    pub empty_sheet_mappings: HashMap<String, HeaderMapping>,
}

impl Ingested {
    /// The mapping that applies to the sheet at `index`: the sheet's own
    /// empty-sheet mapping when it has one, otherwise the reference mapping.
    #[must_use]
    pub fn mapping_for(&self, index: usize) -> Option<&HeaderMapping> {
        let sheet = self.sheets.get(index)?;
        if sheet.is_empty() {
            if let Some(m) = self.empty_sheet_mappings.get(&sheet.name) {
                return Some(m);
            }
        }
        self.mapping.as_ref()
    }
}

/// Ingest a workbook payload.
///
/// `file_name` is used only for the extension allow-list check.
///
/// # Errors
/// `Parse` for an empty payload, an extension outside the allow-list, a
/// corrupt or unsupported container, or a workbook with zero sheets.
pub fn ingest(data: &[u8], file_name: &str, config: &ScanConfig) -> Result<Ingested> {
    if data.is_empty() {
        return Err(GradesheetError::Parse("empty workbook payload".into()));
    }
    check_extension(file_name)?;

    let cursor = Cursor::new(data);
    let mut archive = ZipArchive::new(cursor)
        .map_err(|e| GradesheetError::Parse(format!("unreadable workbook container: {e}")))?;

    let relationships = parse_workbook_relationships(&mut archive);
    let shared_strings = parse_shared_strings(&mut archive, relationships.shared_strings.as_deref());
    let sheet_info = get_sheet_info(&mut archive, &relationships.worksheets)
        .map_err(|e| GradesheetError::Parse(format!("workbook metadata missing: {e}")))?;

    if sheet_info.is_empty() {
        return Err(GradesheetError::Parse("workbook contains no sheets".into()));
    }

    let mut sheets = Vec::with_capacity(sheet_info.len());
    for info in &sheet_info {
        let grid = parse_grid(&mut archive, &info.path, &shared_strings)
            .map_err(|e| GradesheetError::Parse(format!("sheet {:?} unreadable: {e}", info.name)))?;
        let sheet = extract_sheet(&info.name, &grid, config);
        log::debug!(
            "ingested sheet {:?}: {} headers, {} rows",
            sheet.name,
            sheet.headers.len(),
            sheet.rows.len()
        );
        sheets.push(sheet);
    }

    // Reference header pattern: first non-empty sheet.
    let current_sheet = sheets.iter().position(|s| !s.is_empty()).unwrap_or(0);
    let mapping = sheets
        .iter()
        .find(|s| !s.is_empty())
        .and_then(|s| match infer_mapping(&s.headers, config) {
            Ok(m) => Some(m),
            Err(e) => {
                log::warn!("reference mapping unresolved: {e}");
                None
            }
        });

    let mut empty_sheet_mappings = HashMap::new();
    for sheet in sheets.iter().filter(|s| s.is_empty()) {
        if let Some(m) = infer_empty_sheet(&sheet.headers) {
            empty_sheet_mappings.insert(sheet.name.clone(), m);
        }
    }

    Ok(Ingested {
        sheets,
        current_sheet,
        mapping,
        empty_sheet_mappings,
    })
}

fn check_extension(file_name: &str) -> Result<()> {
    let ext = file_name
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(GradesheetError::Parse(format!(
            "unsupported file extension: {file_name:?}"
        )))
    }
}

/// Build a [`Sheet`] from a raw grid using the scanner's outcome.
///
/// When the scanner finds nothing, every column is exposed with positional
/// labels and no row is filtered out.
fn extract_sheet(name: &str, grid: &[Vec<CellScalar>], config: &ScanConfig) -> Sheet {
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);

    let Some(scan) = scan_grid(grid, config) else {
        return fallback_sheet(name, grid, width);
    };

    let headers = header_labels(grid, &scan, width);

    let mut rows = Vec::new();
    for row in grid.iter().skip(scan.data_start()) {
        let id = row.get(scan.identifier_col);
        let name_cell = row.get(scan.name_col);
        let populated =
            |c: Option<&CellScalar>| c.is_some_and(|v| !v.is_empty());
        // A data row needs both an identifier and a name.
        if !populated(id) || !populated(name_cell) {
            continue;
        }
        rows.push(record_from(row, &headers));
    }

    Sheet {
        name: name.to_string(),
        headers,
        rows,
    }
}

/// Header labels from the discovered header row; blanks are synthesized as
/// "Column N" (1-based). A missing header row yields all-positional labels.
fn header_labels(grid: &[Vec<CellScalar>], scan: &GridScan, width: usize) -> Vec<String> {
    let header_row = scan.header_row.and_then(|h| grid.get(h));
    (0..width)
        .map(|col| {
            header_row
                .and_then(|row| row.get(col))
                .filter(|cell| !cell.is_empty())
                .map_or_else(|| format!("Column {}", col + 1), |cell| {
                    cell.display().trim().to_string()
                })
        })
        .collect()
}

/// Scanner found nothing: expose every column positionally and keep every
/// populated row, so no data is silently dropped.
fn fallback_sheet(name: &str, grid: &[Vec<CellScalar>], width: usize) -> Sheet {
    let headers: Vec<String> = (0..width).map(|c| format!("Column {}", c + 1)).collect();
    let rows = grid
        .iter()
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .map(|row| record_from(row, &headers))
        .collect();
    Sheet {
        name: name.to_string(),
        headers,
        rows,
    }
}

fn record_from(row: &[CellScalar], headers: &[String]) -> RowRecord {
    let mut record = RowRecord::default();
    for (idx, header) in headers.iter().enumerate() {
        record.insert(header.clone(), row.get(idx).cloned().unwrap_or_default());
    }
    record
}
