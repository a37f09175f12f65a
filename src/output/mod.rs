//! Output formatting for CLI display
//!
//! This module renders a preview pane for the terminal: sheet tabs and an
//! aligned grid for tabular content, styled paragraphs for documents, and a
//! JSON report for scripting. It also writes sheets back out as CSV.

use crate::preview::{
    Block, Document, Paragraph, ParagraphStyle, PreviewPane, PreviewRequest,
    PreviewState, RenderSurface, Run, Sheet, SurfaceContent, Table,
};
use colored::Colorize;
use serde::Serialize;
use std::io::Write;

/// Serializable snapshot of a pane
#[derive(Debug, Serialize)]
pub struct PreviewReport<'a> {
    pub request: Option<&'a PreviewRequest>,
    pub state: &'a PreviewState,
    pub surface: &'a RenderSurface,
}

impl<'a> PreviewReport<'a> {
    #[must_use]
    pub fn from_pane(pane: &'a PreviewPane) -> Self {
        Self {
            request: pane.request(),
            state: pane.state(),
            surface: pane.surface(),
        }
    }
}

/// Render the pane as pretty JSON
///
/// # Errors
///
/// Returns a `serde_json::Error` if serialization fails.
pub fn render_json(pane: &PreviewPane) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&PreviewReport::from_pane(pane))
}

/// Render the pane for a terminal
#[must_use]
pub fn render_text(pane: &PreviewPane, max_rows: usize) -> String {
    let mut out = String::new();

    if let Some(request) = pane.request() {
        out.push_str(&title_line(request));
        out.push('\n');
    }

    let state = pane.state();
    if state.loading() {
        out.push_str(&"Loading...".dimmed().to_string());
        return out;
    }
    if let Some(error) = state.error() {
        out.push_str(&error.red().to_string());
        return out;
    }

    match pane.surface().content() {
        Some(SurfaceContent::Document { document }) => {
            out.push('\n');
            out.push_str(&format_document(document));
        }
        Some(SurfaceContent::Embed { url }) => {
            out.push_str(&format!("Embedded document: {}", url.cyan()));
        }
        None => {}
    }

    if let Some(sheet) = state.active_sheet() {
        if state.has_multiple_sheets() {
            out.push_str(&sheet_tabs(state.sheets(), state.active_sheet_index()));
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&format_grid(sheet, max_rows));
    }

    if pane.surface().is_empty() && state.sheets().is_empty()
        && let Some(request) = pane.request()
    {
        out.push_str(&fallback_link(request));
    }

    out
}

fn title_line(request: &PreviewRequest) -> String {
    let name = if request.display_name().is_empty() {
        request.source_url()
    } else {
        request.display_name()
    };
    format!("{} [{}]", name.bold(), request.declared_type())
}

/// Message shown when nothing could be rendered in place
#[must_use]
pub fn fallback_link(request: &PreviewRequest) -> String {
    format!(
        "Preview not available. Open externally: {}",
        request.source_url().cyan()
    )
}

/// Tab strip with the active sheet highlighted
#[must_use]
pub fn sheet_tabs(sheets: &[Sheet], active: usize) -> String {
    sheets
        .iter()
        .enumerate()
        .map(|(i, sheet)| {
            if i == active {
                format!("[{}]", sheet.name).bold().to_string()
            } else {
                format!(" {} ", sheet.name)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Aligned grid with the first row styled as a header
#[must_use]
pub fn format_grid(sheet: &Sheet, max_rows: usize) -> String {
    let shown: Vec<Vec<String>> = sheet
        .rows
        .iter()
        .take(max_rows)
        .map(|row| row.iter().map(|c| flatten_cell(c)).collect())
        .collect();

    let width = shown.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; width];
    for row in &shown {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(shown.len() + 1);
    for (r, row) in shown.iter().enumerate() {
        let cells: Vec<String> = (0..width)
            .map(|i| {
                let cell = row.get(i).map_or("", String::as_str);
                format!("{cell:<w$}", w = widths[i])
            })
            .collect();
        let line = cells.join(" | ").trim_end().to_string();
        if r == 0 {
            lines.push(line.bold().to_string());
        } else {
            lines.push(line);
        }
    }

    if sheet.rows.len() > max_rows {
        lines.push(format!(
            "[... truncated, showing {} of {} rows ...]",
            max_rows,
            sheet.rows.len()
        ));
    }

    lines.join("\n")
}

fn flatten_cell(cell: &str) -> String {
    cell.replace(['\n', '\r', '\t'], " ")
}

/// Styled rendering of a converted document
#[must_use]
pub fn format_document(document: &Document) -> String {
    document
        .blocks
        .iter()
        .map(format_block)
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_block(block: &Block) -> String {
    match block {
        Block::Paragraph(p) => format_paragraph(p),
        Block::Table(t) => format_table(t),
    }
}

fn format_paragraph(paragraph: &Paragraph) -> String {
    match paragraph.style {
        ParagraphStyle::Title | ParagraphStyle::Heading(1) => {
            paragraph.text().to_uppercase().bold().underline().to_string()
        }
        ParagraphStyle::Heading(_) => paragraph.text().bold().to_string(),
        ParagraphStyle::ListItem => format!("  • {}", styled_runs(&paragraph.runs)),
        ParagraphStyle::Normal => styled_runs(&paragraph.runs),
    }
}

fn styled_runs(runs: &[Run]) -> String {
    runs.iter()
        .map(|run| {
            let mut text = run.text.normal();
            if run.bold {
                text = text.bold();
            }
            if run.italic {
                text = text.italic();
            }
            if run.underline {
                text = text.underline();
            }
            text.to_string()
        })
        .collect()
}

fn format_table(table: &Table) -> String {
    let sheet = Sheet::new(
        "",
        table
            .rows
            .iter()
            .map(|row| row.cells.iter().map(crate::preview::TableCell::text).collect())
            .collect(),
    );
    format_grid(&sheet, usize::MAX)
}

/// Write a sheet as RFC 4180 CSV
///
/// Ragged rows are written as-is.
///
/// # Errors
///
/// Returns a `csv::Error` if writing fails.
pub fn export_sheet_csv<W: Write>(sheet: &Sheet, writer: W) -> csv::Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    for row in &sheet.rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
