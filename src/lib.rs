//! Docview - fetch and preview documents, spreadsheets and CSV files
//!
//! This library provides a preview pane that fetches a file's bytes and
//! turns them into a displayable form: a styled document for word-processor
//! formats, named sheets for workbooks and CSV, an embed for PDF.

use thiserror::Error;

pub mod cli;
pub mod config;
pub mod logging;
pub mod output;
pub mod preview;

#[cfg(test)]
pub mod testing;

/// Error enum, contains all failure states of the program
#[derive(Debug, Error)]
pub enum DocviewError {
    /// Preview error
    #[error("Preview error: {0}")]
    PreviewError(#[from] preview::PreviewError),
    /// Fetch setup error
    #[error("Fetch error: {0}")]
    FetchError(#[from] preview::FetchError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ::config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// CSV export error
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    /// JSON output error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for docview operations
pub type Result<T> = std::result::Result<T, DocviewError>;
