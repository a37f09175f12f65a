//! Preview error types

use thiserror::Error;

/// Errors raised while fetching the bytes behind a preview request
#[derive(Debug, Error)]
pub enum FetchError {
    /// Server answered with a non-success status
    #[error("Server responded with status {0}")]
    Status(u16),

    /// Network or protocol failure
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Local file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Source string is neither a URL nor a usable path
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// Payload exceeds the size limit; `size` is the advertised or observed length
    #[error("Payload of {size} bytes exceeds limit of {max} bytes")]
    TooLarge { size: u64, max: u64 },
}

/// Errors raised while converting a word-processor document
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Payload is not a readable ZIP container
    #[error("{0}")]
    Archive(#[from] zip::result::ZipError),

    /// A required package part is absent
    #[error("missing document part: {0}")]
    MissingPart(String),

    /// Malformed document XML
    #[error("invalid document XML: {0}")]
    Xml(String),

    /// IO error while reading a package part
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A package part decompresses past the size limit
    #[error("document part {part} exceeds {max} bytes")]
    PartTooLarge { part: String, max: u64 },
}

impl From<quick_xml::Error> for DocumentError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

/// Errors raised while reading a spreadsheet workbook
#[derive(Debug, Error)]
pub enum WorkbookError {
    /// Workbook container could not be opened or recognised
    #[error("{0}")]
    Open(String),

    /// A named sheet could not be read
    #[error("sheet '{name}': {message}")]
    Sheet { name: String, message: String },
}

/// Errors surfaced by the preview pane
///
/// Every load failure collapses to the `Display` text of one of these
/// variants, which becomes the pane's error string.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// Fetch failed; the cause is logged, not shown
    #[error("Failed to fetch file")]
    Fetch(FetchError),

    /// Document conversion failed
    #[error("Failed to render document: {0}")]
    Document(#[from] DocumentError),

    /// Workbook parsing failed
    #[error("Failed to parse spreadsheet: {0}")]
    Workbook(#[from] WorkbookError),

    /// Payload exceeds the configured limit
    #[error("File too large: {0} bytes (max: {1} bytes)")]
    FileTooLarge(u64, u64),

    /// Sheet index outside the loaded collection
    #[error("Sheet index {index} out of range ({len} sheet(s) loaded)")]
    SheetOutOfRange { index: usize, len: usize },
}

impl From<FetchError> for PreviewError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::TooLarge { size, max } => Self::FileTooLarge(size, max),
            other => Self::Fetch(other),
        }
    }
}

/// Result type for preview operations
pub type Result<T> = std::result::Result<T, PreviewError>;
