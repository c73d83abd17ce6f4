//! Generates a complete, minimal XLSX workbook from assembled rows.
//!
//! Text cells use inline strings (`t="inlineStr"`) so no shared string table
//! has to be built; numbers are written as plain `<v>` values.

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::ZipWriter;

use crate::cell_ref::col_to_letter;
use crate::error::Result;
use crate::types::{CellScalar, RowRecord};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

/// Assemble a single-sheet workbook ZIP from header labels and data rows.
///
/// Returns the complete XLSX file as `Vec<u8>`.
pub fn write_workbook(
    headers: &[String],
    rows: &[RowRecord],
    sheet_name: &str,
) -> Result<Vec<u8>> {
    let buf: Vec<u8> = Vec::with_capacity(4096);
    let mut writer = ZipWriter::new(Cursor::new(buf));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    writer.start_file("[Content_Types].xml", options)?;
    writer.write_all(CONTENT_TYPES.as_bytes())?;

    writer.start_file("_rels/.rels", options)?;
    writer.write_all(ROOT_RELS.as_bytes())?;

    writer.start_file("xl/workbook.xml", options)?;
    writer.write_all(workbook_xml(sheet_name).as_bytes())?;

    writer.start_file("xl/_rels/workbook.xml.rels", options)?;
    writer.write_all(WORKBOOK_RELS.as_bytes())?;

    writer.start_file("xl/worksheets/sheet1.xml", options)?;
    writer.write_all(write_sheet_xml(headers, rows).as_bytes())?;

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

fn workbook_xml(sheet_name: &str) -> String {
    let mut out = String::with_capacity(512);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(
        r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
    );
    out.push_str(
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    out.push_str("<sheets>");
    out.push_str(&format!(
        r#"<sheet name="{}" sheetId="1" r:id="rId1"/>"#,
        xml_escape(sheet_name)
    ));
    out.push_str("</sheets></workbook>");
    out
}

/// Write the worksheet XML: one header row, then one row per record.
fn write_sheet_xml(headers: &[String], rows: &[RowRecord]) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );
    out.push('\n');

    out.push_str("<sheetData>\n");
    out.push_str("<row r=\"1\">");
    for (col, header) in headers.iter().enumerate() {
        write_text_cell(&mut out, 0, col_u32(col), header);
    }
    out.push_str("</row>\n");

    for (r, record) in rows.iter().enumerate() {
        let row = col_u32(r) + 1;
        out.push_str(&format!("<row r=\"{}\">", row + 1));
        for (col, header) in headers.iter().enumerate() {
            write_cell(&mut out, row, col_u32(col), record.get(header));
        }
        out.push_str("</row>\n");
    }
    out.push_str("</sheetData>\n");

    out.push_str("</worksheet>");
    out
}

/// Write a single `<c>` element for a scalar value. Empty cells are elided.
fn write_cell(out: &mut String, row: u32, col: u32, value: &CellScalar) {
    match value {
        CellScalar::Empty => {}
        CellScalar::Number(n) => {
            let cell_ref = format!("{}{}", col_to_letter(col), row + 1);
            out.push_str(&format!("<c r=\"{cell_ref}\"><v>{n}</v></c>"));
        }
        CellScalar::Text(s) => write_text_cell(out, row, col, s),
    }
}

fn write_text_cell(out: &mut String, row: u32, col: u32, text: &str) {
    let cell_ref = format!("{}{}", col_to_letter(col), row + 1);
    out.push_str(&format!("<c r=\"{cell_ref}\" t=\"inlineStr\"><is><t>"));
    out.push_str(&xml_escape(text));
    out.push_str("</t></is></c>");
}

#[allow(clippy::cast_possible_truncation)]
fn col_u32(idx: usize) -> u32 {
    idx as u32
}

/// Minimal XML escaping for attribute/text content.
fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
