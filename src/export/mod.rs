//! Snapshot export: flatten the current grade state into rows and write a
//! fresh workbook.

mod sheet_writer;

pub use sheet_writer::write_workbook;

use crate::store::GradeStore;
use crate::types::{CellScalar, HeaderMapping, RowRecord, Sheet};

/// Column order for an exported sheet: identifier, name, then the grade
/// columns with the primary first.
#[must_use]
pub fn export_headers(mapping: &HeaderMapping) -> Vec<String> {
    let mut headers = vec![
        mapping.identifier_column.clone(),
        mapping.name_column.clone(),
    ];
    headers.extend(mapping.grade_columns().map(String::from));
    headers
}

/// Build the rows for a snapshot of `sheet` with `store` overlaid.
///
/// For each grade cell the precedence is: committed value in the store,
/// then the original sheet value, then empty. An empty sheet produces a
/// single blank template row so the exported file still shows the mapped
/// column structure.
#[must_use]
pub fn assemble(sheet: &Sheet, mapping: &HeaderMapping, store: &GradeStore) -> Vec<RowRecord> {
    if sheet.rows.is_empty() {
        let mut blank = RowRecord::default();
        for header in export_headers(mapping) {
            blank.insert(header, CellScalar::Empty);
        }
        return vec![blank];
    }

    sheet
        .rows
        .iter()
        .map(|row| {
            let id = row.identifier(mapping).display();
            let mut out = RowRecord::default();
            out.insert(mapping.identifier_column.as_str(), row.identifier(mapping).clone());
            out.insert(mapping.name_column.as_str(), row.name(mapping).clone());
            for column in mapping.grade_columns() {
                let value = store
                    .get(&id, column)
                    .cloned()
                    .unwrap_or_else(|| row.get(column).clone());
                out.insert(column, value);
            }
            out
        })
        .collect()
}
