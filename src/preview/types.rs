//! Preview content types

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// File type declared by whoever supplied the preview request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclaredType {
    Pdf,
    Doc,
    Docx,
    Xls,
    Xlsx,
    Csv,
    Other,
}

/// How a declared type gets turned into something displayable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatFamily {
    /// Word-processor formats, converted into a styled [`Document`]
    Document,
    /// Binary workbooks, parsed into sheets
    Spreadsheet,
    /// Comma-delimited text, split into a single sheet
    Delimited,
    /// Displayed natively by the host, no bytes needed
    Embed,
    /// No transformation; the host supplies its own fallback
    Unsupported,
}

impl DeclaredType {
    /// Parse a type tag such as `"docx"` or `".XLSX"`
    ///
    /// Unknown tags map to [`DeclaredType::Other`].
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim();
        let tag = tag.strip_prefix('.').unwrap_or(tag);
        match tag.to_ascii_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "doc" => Self::Doc,
            "docx" => Self::Docx,
            "xls" => Self::Xls,
            "xlsx" => Self::Xlsx,
            "csv" => Self::Csv,
            _ => Self::Other,
        }
    }

    /// Map a MIME type, ignoring any parameters after `;`
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "application/pdf" => Self::Pdf,
            "application/msword" => Self::Doc,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Self::Docx,
            "application/vnd.ms-excel" => Self::Xls,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => Self::Xlsx,
            "text/csv" => Self::Csv,
            _ => Self::Other,
        }
    }

    /// Infer the type from a file name, path or URL extension
    ///
    /// Query strings and fragments are ignored so that signed storage URLs
    /// still resolve to their file type.
    #[must_use]
    pub fn from_file_name(name: &str) -> Self {
        let path_part = name.split(['?', '#']).next().unwrap_or_default();
        Path::new(path_part)
            .extension()
            .and_then(|e| e.to_str())
            .map_or(Self::Other, Self::from_tag)
    }

    /// Family that decides how the pane dispatches this type
    #[must_use]
    pub const fn family(self) -> FormatFamily {
        match self {
            Self::Doc | Self::Docx => FormatFamily::Document,
            Self::Xls | Self::Xlsx => FormatFamily::Spreadsheet,
            Self::Csv => FormatFamily::Delimited,
            Self::Pdf => FormatFamily::Embed,
            Self::Other => FormatFamily::Unsupported,
        }
    }

    /// Lowercase tag for display
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
            Self::Other => "other",
        }
    }
}

impl FormatFamily {
    /// Whether loading this family needs the file's bytes
    #[must_use]
    pub const fn needs_bytes(self) -> bool {
        match self {
            Self::Document | Self::Spreadsheet | Self::Delimited => true,
            Self::Embed | Self::Unsupported => false,
        }
    }
}

impl FromStr for DeclaredType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_tag(s))
    }
}

impl std::fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single preview session's input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRequest {
    source_url: String,
    declared_type: DeclaredType,
    display_name: String,
}

impl PreviewRequest {
    #[must_use]
    pub fn new(
        source_url: impl Into<String>,
        declared_type: DeclaredType,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            declared_type,
            display_name: display_name.into(),
        }
    }

    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    #[must_use]
    pub const fn declared_type(&self) -> DeclaredType {
        self.declared_type
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// One row of rendered cell values
pub type Row = Vec<String>;

/// A named grid of rows
///
/// The first row is the header row for styling only; it stays part of
/// `rows`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

impl Sheet {
    #[must_use]
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Row to style as a header, if any
    #[must_use]
    pub fn header(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Widest row length
    #[must_use]
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Sheets in original workbook order
pub type SheetCollection = Vec<Sheet>;

/// Rich document produced from a word-processor file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParagraphStyle {
    #[default]
    Normal,
    Title,
    Heading(u8),
    ListItem,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub style: ParagraphStyle,
    pub runs: Vec<Run>,
}

/// Contiguous text sharing one set of character styles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCell {
    pub blocks: Vec<Block>,
}

impl Paragraph {
    /// Concatenated run text
    #[must_use]
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Append text, merging into the last run when styles match
    pub fn push_text(&mut self, text: &str, bold: bool, italic: bool, underline: bool) {
        if let Some(last) = self.runs.last_mut()
            && last.bold == bold
            && last.italic == italic
            && last.underline == underline
        {
            last.text.push_str(text);
            return;
        }
        self.runs.push(Run {
            text: text.to_string(),
            bold,
            italic,
            underline,
        });
    }
}

impl TableCell {
    /// Plain text of the cell, paragraphs joined by spaces
    #[must_use]
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| match b {
                Block::Paragraph(p) => p.text(),
                Block::Table(t) => t.to_string().replace('\n', " "),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Document {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Top-level paragraphs, skipping tables
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
    }

    /// Plain-text rendering
    ///
    /// Note: Also available via the `Display` trait
    #[must_use]
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lines: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let cells: Vec<String> = row.cells.iter().map(TableCell::text).collect();
                format!("| {} |", cells.join(" | "))
            })
            .collect();
        write!(f, "{}", lines.join("\n"))
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for block in &self.blocks {
            if !first {
                writeln!(f)?;
            }
            first = false;
            match block {
                Block::Paragraph(p) => match p.style {
                    ParagraphStyle::Title | ParagraphStyle::Heading(1) => {
                        write!(f, "# {}", p.text())?;
                    }
                    ParagraphStyle::Heading(level) => {
                        write!(f, "{} {}", "#".repeat(usize::from(level)), p.text())?;
                    }
                    ParagraphStyle::ListItem => write!(f, "- {}", p.text())?,
                    ParagraphStyle::Normal => write!(f, "{}", p.text())?,
                },
                Block::Table(t) => write!(f, "{t}")?,
            }
        }
        Ok(())
    }
}
