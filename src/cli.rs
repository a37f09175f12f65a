//! Command-line interface definitions and parsing
//!
//! This module defines the CLI structure for docview using the `clap` crate
//! and turns parsed arguments into a [`PreviewRequest`].
//!
//! # Commands
//!
//! - **show**: Fetch a file and render its preview (alias `s`)
//! - **config**: Inspect or initialise the configuration file
//!
//! # Examples
//!
//! ```bash
//! # Preview a spreadsheet, second sheet
//! docview show https://files.example.com/report.xlsx --sheet 1
//!
//! # Preview a file whose URL has no extension
//! docview show https://drive.example.com/uc?id=abc -t docx -n "Minutes"
//!
//! # Export the active sheet as CSV
//! docview show data.xls --export data.csv
//! ```

use crate::config::OutputFormat;
use crate::preview::{DeclaredType, PreviewRequest};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Fetch and preview documents, spreadsheets and CSV files
#[derive(Parser, Debug)]
#[command(name = "docview", version, about, long_about = None)]
pub struct Cli {
    /// Suppress informational output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a file and render its preview
    #[command(visible_alias = "s")]
    Show(ShowArgs),

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct ShowArgs {
    /// URL or local path of the file
    pub source: String,

    /// Declared file type (pdf, doc, docx, xls, xlsx, csv); inferred from the source if omitted
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub file_type: Option<String>,

    /// Name to display; defaults to the source's file name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Sheet to show, zero-based
    #[arg(short, long, default_value_t = 0)]
    pub sheet: usize,

    /// Rows to print per sheet (overrides config)
    #[arg(long, value_name = "N")]
    pub max_rows: Option<usize>,

    /// Output format (overrides config)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Open PDFs and unsupported files with the system handler
    #[arg(long)]
    pub open: bool,

    /// Write the active sheet to this path as CSV
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print the configuration file location
    Path,
    /// Write the default configuration file if none exists
    Init,
}

impl Cli {
    /// Parse command-line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl ShowArgs {
    /// Declared type from `--type`, or inferred from the source
    #[must_use]
    pub fn declared_type(&self) -> DeclaredType {
        self.file_type.as_deref().map_or_else(
            || DeclaredType::from_file_name(&self.source),
            DeclaredType::from_tag,
        )
    }

    /// Display name from `--name`, or the source's last path segment
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let path_part = self.source.split(['?', '#']).next().unwrap_or_default();
        Path::new(path_part)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.source)
            .to_string()
    }

    #[must_use]
    pub fn to_request(&self) -> PreviewRequest {
        PreviewRequest::new(self.source.clone(), self.declared_type(), self.display_name())
    }
}
