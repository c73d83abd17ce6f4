//! Shared fixture builder: assembles small workbooks in memory so each test
//! controls the exact grid it ingests.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::cast_possible_truncation
)]

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::ZipWriter;

use gradesheet::cell_ref::col_to_letter;

/// One fixture cell. `Blank` emits no `<c>` element at all.
#[derive(Clone, Copy)]
pub enum Val {
    N(f64),
    S(&'static str),
    Blank,
}

/// Build a workbook whose text cells use inline strings.
pub fn build_workbook(sheets: &[(&str, &[&[Val]])]) -> Vec<u8> {
    build(sheets, false)
}

/// Build a workbook whose text cells go through a shared string table.
pub fn build_workbook_shared(sheets: &[(&str, &[&[Val]])]) -> Vec<u8> {
    build(sheets, true)
}

fn build(sheets: &[(&str, &[&[Val]])], shared: bool) -> Vec<u8> {
    let mut sst: Vec<&'static str> = Vec::new();
    if shared {
        for (_, rows) in sheets {
            for row in *rows {
                for val in *row {
                    if let Val::S(s) = val {
                        if !sst.contains(s) {
                            sst.push(s);
                        }
                    }
                }
            }
        }
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    writer
        .start_file("[Content_Types].xml", options)
        .expect("zip entry");
    writer
        .write_all(content_types(sheets.len(), shared).as_bytes())
        .expect("zip write");

    writer.start_file("_rels/.rels", options).expect("zip entry");
    writer
        .write_all(
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#,
        )
        .expect("zip write");

    writer
        .start_file("xl/workbook.xml", options)
        .expect("zip entry");
    writer
        .write_all(workbook_xml(sheets).as_bytes())
        .expect("zip write");

    writer
        .start_file("xl/_rels/workbook.xml.rels", options)
        .expect("zip entry");
    writer
        .write_all(workbook_rels(sheets.len(), shared).as_bytes())
        .expect("zip write");

    if shared {
        writer
            .start_file("xl/sharedStrings.xml", options)
            .expect("zip entry");
        writer
            .write_all(shared_strings_xml(&sst).as_bytes())
            .expect("zip write");
    }

    for (idx, (_, rows)) in sheets.iter().enumerate() {
        writer
            .start_file(format!("xl/worksheets/sheet{}.xml", idx + 1), options)
            .expect("zip entry");
        writer
            .write_all(sheet_xml(rows, shared.then_some(&sst)).as_bytes())
            .expect("zip write");
    }

    writer.finish().expect("zip finish").into_inner()
}

fn content_types(sheet_count: usize, shared: bool) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
"#,
    );
    for idx in 1..=sheet_count {
        out.push_str(&format!(
            "<Override PartName=\"/xl/worksheets/sheet{idx}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>\n"
        ));
    }
    if shared {
        out.push_str("<Override PartName=\"/xl/sharedStrings.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml\"/>\n");
    }
    out.push_str("</Types>");
    out
}

fn workbook_xml(sheets: &[(&str, &[&[Val]])]) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    for (idx, (name, _)) in sheets.iter().enumerate() {
        out.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape(name),
            idx + 1,
            idx + 1
        ));
    }
    out.push_str("</sheets></workbook>");
    out
}

fn workbook_rels(sheet_count: usize, shared: bool) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#,
    );
    for idx in 1..=sheet_count {
        out.push_str(&format!(
            "<Relationship Id=\"rId{idx}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet{idx}.xml\"/>\n"
        ));
    }
    if shared {
        out.push_str(&format!(
            "<Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings\" Target=\"sharedStrings.xml\"/>\n",
            sheet_count + 1
        ));
    }
    out.push_str("</Relationships>");
    out
}

fn shared_strings_xml(sst: &[&'static str]) -> String {
    let mut out = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        sst.len()
    );
    for s in sst {
        out.push_str("<si><t>");
        out.push_str(&escape(s));
        out.push_str("</t></si>");
    }
    out.push_str("</sst>");
    out
}

fn sheet_xml(rows: &[&[Val]], sst: Option<&Vec<&'static str>>) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, row) in rows.iter().enumerate() {
        out.push_str(&format!("<row r=\"{}\">", r + 1));
        for (c, val) in row.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let cell_ref = format!("{}{}", col_to_letter(c as u32), r + 1);
            match val {
                Val::N(n) => out.push_str(&format!("<c r=\"{cell_ref}\"><v>{n}</v></c>")),
                Val::S(s) => match sst {
                    Some(table) => {
                        let idx = table
                            .iter()
                            .position(|t| t == s)
                            .expect("string present in table");
                        out.push_str(&format!("<c r=\"{cell_ref}\" t=\"s\"><v>{idx}</v></c>"));
                    }
                    None => out.push_str(&format!(
                        "<c r=\"{cell_ref}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                        escape(s)
                    )),
                },
                Val::Blank => {}
            }
        }
        out.push_str("</row>");
    }
    out.push_str("</sheetData></worksheet>");
    out
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;")
}
