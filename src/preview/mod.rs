//! Document preview pipeline
//!
//! This module turns a [`PreviewRequest`] into something displayable:
//! - Word-processor files (doc, docx) into a styled [`Document`]
//! - Workbooks (xls, xlsx) into named sheets
//! - CSV into a single sheet using a naive comma split
//! - PDF into an embed of the source URL
//! - Anything else is left to the host's own fallback

mod cancel;
pub mod delimited;
pub mod docx;
mod error;
mod fetch;
mod pane;
mod state;
mod surface;
mod types;
pub mod workbook;

pub use cancel::LoadToken;
pub use error::{DocumentError, FetchError, PreviewError, Result, WorkbookError};
pub use fetch::{FileFetcher, Fetcher, HttpFetcher, SourceFetcher};
pub use pane::{DEFAULT_MAX_FILE_SIZE, FetchOutcome, FetchedLoad, PendingLoad, PreviewPane};
pub use state::PreviewState;
pub use surface::{RenderSurface, SurfaceContent};
pub use types::{
    Block, DeclaredType, Document, FormatFamily, Paragraph, ParagraphStyle, PreviewRequest, Row,
    Run, Sheet, SheetCollection, Table, TableCell, TableRow,
};
