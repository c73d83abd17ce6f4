//! Utilities for Excel-style cell references.

/// Parse a cell reference from raw bytes (ASCII) into (col, row), 0-indexed.
///
/// Used on raw XML attribute values (e.g. `attr.value` from quick-xml).
#[must_use]
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for &b in ref_bytes {
        if b == b'$' {
            continue;
        }
        if b.is_ascii_alphabetic() {
            let upper = if b.is_ascii_lowercase() { b - 32 } else { b };
            col = col * 26 + (u32::from(upper - b'A') + 1);
            saw_col = true;
        } else if b.is_ascii_digit() {
            row = row * 10 + u32::from(b - b'0');
            saw_row = true;
        } else {
            return None;
        }
    }

    if !saw_col || !saw_row {
        return None;
    }

    Some((col.saturating_sub(1), row.saturating_sub(1)))
}

/// Convert a 0-indexed column number into its letter form ("A", "Z", "AA").
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn col_to_letter(col: u32) -> String {
    let mut result = String::new();
    let mut n = col + 1; // Convert to 1-based
    while n > 0 {
        n -= 1;
        let c = char::from(b'A' + (n % 26) as u8);
        result.insert(0, c);
        n /= 26;
    }
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(b"A1", Some((0, 0)); "origin")]
    #[test_case(b"C3", Some((2, 2)); "c3")]
    #[test_case(b"AA10", Some((26, 9)); "double letter")]
    #[test_case(b"$B$2", Some((1, 1)); "absolute")]
    #[test_case(b"9", None; "row only")]
    #[test_case(b"A", None; "col only")]
    fn parses_refs(bytes: &[u8], expected: Option<(u32, u32)>) {
        assert_eq!(parse_cell_ref_bytes(bytes), expected);
    }

    #[test_case(0, "A")]
    #[test_case(25, "Z")]
    #[test_case(26, "AA")]
    #[test_case(27, "AB")]
    fn letters(col: u32, expected: &str) {
        assert_eq!(col_to_letter(col), expected);
    }
}
