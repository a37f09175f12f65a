//! Comma-delimited text into a single sheet
//!
//! The split is deliberately naive: quoted fields containing commas or
//! newlines are not recognised.

use super::types::{Row, Sheet};

/// Name given to the only sheet of a delimited file
pub const DELIMITED_SHEET_NAME: &str = "Sheet1";

/// Decode fetched bytes and split them into a sheet
#[must_use]
pub fn parse_bytes(bytes: &[u8]) -> Sheet {
    parse(&String::from_utf8_lossy(bytes))
}

/// Split text on newlines, then commas
#[must_use]
pub fn parse(text: &str) -> Sheet {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let body = text.strip_suffix('\n').unwrap_or(text);

    let rows: Vec<Row> = if body.is_empty() {
        Vec::new()
    } else {
        body.split('\n')
            .map(|line| {
                let line = line.strip_suffix('\r').unwrap_or(line);
                line.split(',').map(clean_cell).collect()
            })
            .collect()
    };

    Sheet::new(DELIMITED_SHEET_NAME, rows)
}

/// Strip surrounding blanks, then one surrounding quote on each side
fn clean_cell(raw: &str) -> String {
    let cell = raw.trim();
    let cell = cell.strip_prefix('"').unwrap_or(cell);
    let cell = cell.strip_suffix('"').unwrap_or(cell);
    cell.to_string()
}
