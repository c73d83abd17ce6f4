//! Worksheet parsing - streams a sheet's XML into a row-major cell grid.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::parse_cell_ref_bytes;
use crate::error::Result;
use crate::types::CellScalar;

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone)]
enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Default,
}

fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        _ => CellTypeTag::Default,
    }
}

/// Parse one worksheet into a dense row-major grid of scalars.
///
/// Gaps are filled with `CellScalar::Empty` so the scanner can index by
/// (row, col) without spatial lookups.
pub(super) fn parse_grid<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
    shared_strings: &[String],
) -> Result<Vec<Vec<CellScalar>>> {
    let file = archive.by_name(path)?;

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut grid: Vec<Vec<CellScalar>> = Vec::new();
    let mut buf = Vec::new();
    let mut cell_buf = Vec::new();
    let mut text_buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(_) | Event::Empty(_))) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                    continue;
                };
                let is_start_event = matches!(event, Event::Start(_));

                if e.local_name().as_ref() != b"c" {
                    continue;
                }

                // Cell element - parse attributes first
                let mut col: u32 = 0;
                let mut row: u32 = 0;
                let mut cell_type = CellTypeTag::Default;

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"r" => {
                            if let Some((c, r)) = parse_cell_ref_bytes(&attr.value) {
                                col = c;
                                row = r;
                            }
                        }
                        b"t" => {
                            cell_type = parse_cell_type_tag(&attr.value);
                        }
                        _ => {}
                    }
                }

                // Read the cell value from child elements. Empty/self-closing
                // cells like <c r="A1"/> have no children.
                let mut value: Option<String> = None;
                if is_start_event {
                    loop {
                        cell_buf.clear();
                        match xml.read_event_into(&mut cell_buf) {
                            Ok(Event::Start(ref inner)) => {
                                let inner_name = inner.local_name();
                                let inner_name = inner_name.as_ref();

                                if inner_name == b"v" || inner_name == b"t" {
                                    // Value or inline text (direct child of <c>)
                                    text_buf.clear();
                                    if let Ok(Event::Text(text)) =
                                        xml.read_event_into(&mut text_buf)
                                    {
                                        value = text.unescape().ok().map(|s| s.to_string());
                                    }
                                } else if inner_name == b"is" {
                                    // Inline string container <is><t>text</t></is>
                                    value = read_inline_string(&mut xml, &mut text_buf);
                                }
                            }
                            Ok(Event::End(ref inner)) => {
                                if inner.local_name().as_ref() == b"c" {
                                    break;
                                }
                            }
                            Ok(Event::Eof) | Err(_) => break,
                            _ => {}
                        }
                    }
                }

                let scalar = resolve_scalar(value.as_deref(), cell_type, shared_strings);
                if !matches!(scalar, CellScalar::Empty) {
                    set_cell(&mut grid, row as usize, col as usize, scalar);
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(grid)
}

/// Read `<is><t>text</t></is>` nested under a `<c>` element.
fn read_inline_string<R: std::io::BufRead>(
    xml: &mut Reader<R>,
    text_buf: &mut Vec<u8>,
) -> Option<String> {
    let mut value = None;
    loop {
        text_buf.clear();
        match xml.read_event_into(text_buf) {
            Ok(Event::Start(ref is_inner)) => {
                if is_inner.local_name().as_ref() == b"t" {
                    let mut t_buf = Vec::new();
                    if let Ok(Event::Text(text)) = xml.read_event_into(&mut t_buf) {
                        value = text.unescape().ok().map(|s| s.to_string());
                    }
                }
            }
            Ok(Event::End(ref is_inner)) => {
                if is_inner.local_name().as_ref() == b"is" {
                    break;
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    value
}

/// Resolve the raw `<v>` text plus type tag into a [`CellScalar`].
fn resolve_scalar(
    value: Option<&str>,
    cell_type: CellTypeTag,
    shared_strings: &[String],
) -> CellScalar {
    let Some(raw) = value else {
        return CellScalar::Empty;
    };
    if raw.trim().is_empty() {
        return CellScalar::Empty;
    }

    match cell_type {
        CellTypeTag::Shared => raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|idx| shared_strings.get(idx))
            .map_or(CellScalar::Empty, |s| {
                if s.trim().is_empty() {
                    CellScalar::Empty
                } else {
                    CellScalar::Text(s.clone())
                }
            }),
        CellTypeTag::Inline | CellTypeTag::Str => CellScalar::Text(raw.to_string()),
        CellTypeTag::Bool => CellScalar::Text(if raw.trim() == "1" {
            "TRUE".to_string()
        } else {
            "FALSE".to_string()
        }),
        CellTypeTag::Error => CellScalar::Text(raw.to_string()),
        CellTypeTag::Default => raw
            .trim()
            .parse::<f64>()
            .map_or_else(|_| CellScalar::Text(raw.to_string()), CellScalar::Number),
    }
}

/// Place a value at (row, col), growing the grid with empty cells as needed.
fn set_cell(grid: &mut Vec<Vec<CellScalar>>, row: usize, col: usize, value: CellScalar) {
    while grid.len() <= row {
        grid.push(Vec::new());
    }
    if let Some(r) = grid.get_mut(row) {
        while r.len() <= col {
            r.push(CellScalar::Empty);
        }
        if let Some(slot) = r.get_mut(col) {
            *slot = value;
        }
    }
}
