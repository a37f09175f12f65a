//! Spreadsheet workbooks (xls, xlsx) into sheets using calamine

use super::error::WorkbookError;
use super::types::{Row, Sheet, SheetCollection};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use std::io::Cursor;
use tracing::debug;

/// Parse workbook bytes into sheets, keeping workbook order
///
/// Format (BIFF, OOXML, ODS) is sniffed from the content, not from the
/// declared type.
///
/// # Errors
///
/// Returns [`WorkbookError::Open`] if the bytes are not a recognised
/// workbook, or [`WorkbookError::Sheet`] if a listed sheet cannot be read.
pub fn parse(bytes: Vec<u8>) -> Result<SheetCollection, WorkbookError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| WorkbookError::Open(e.to_string()))?;

    let names = workbook.sheet_names();
    debug!(sheets = names.len(), "opened workbook");

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| WorkbookError::Sheet {
                name: name.clone(),
                message: e.to_string(),
            })?;

        let rows: Vec<Row> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        sheets.push(Sheet::new(name, rows));
    }

    Ok(sheets)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Bool(b) => String::from(if *b { "TRUE" } else { "FALSE" }),
        other => other.to_string(),
    }
}
