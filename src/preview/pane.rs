//! Preview pane: request lifecycle, dispatch and cancellation

use super::cancel::LoadToken;
use super::delimited;
use super::docx;
use super::error::{FetchError, PreviewError, Result};
use super::fetch::Fetcher;
use super::state::PreviewState;
use super::surface::RenderSurface;
use super::types::{FormatFamily, PreviewRequest, Row, Sheet};
use super::workbook;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default ceiling on fetched payloads (25 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 25 * 1024 * 1024;

/// Renders one preview request at a time
///
/// Loading is split in three steps so that a host can interleave requests:
/// [`begin`](Self::begin) resets the pane and hands out a [`PendingLoad`],
/// [`PendingLoad::fetch`] is the only suspension point, and
/// [`complete`](Self::complete) applies the result if, and only if, it still
/// belongs to the live attempt. [`load`](Self::load) chains all three.
pub struct PreviewPane {
    fetcher: Arc<dyn Fetcher>,
    max_file_size: u64,
    state: PreviewState,
    surface: RenderSurface,
    request: Option<PreviewRequest>,
    live: Option<LoadToken>,
    attempts: u64,
}

/// A started load waiting for its bytes
#[must_use = "a pending load does nothing until fetched and completed"]
pub struct PendingLoad {
    request: PreviewRequest,
    token: LoadToken,
    fetcher: Arc<dyn Fetcher>,
    max_file_size: u64,
}

/// Outcome of the fetch step
#[derive(Debug)]
pub enum FetchOutcome {
    /// Bytes arrived
    Fetched(Vec<u8>),
    /// The fetch itself failed
    Failed(FetchError),
    /// The type needs no bytes
    Skipped,
    /// The attempt was superseded before the fetch finished
    Cancelled,
}

/// A fetched load ready to be applied
#[must_use = "a fetched load has no effect until passed to PreviewPane::complete"]
#[derive(Debug)]
pub struct FetchedLoad {
    request: PreviewRequest,
    token: LoadToken,
    outcome: FetchOutcome,
}

impl FetchedLoad {
    #[must_use]
    pub const fn outcome(&self) -> &FetchOutcome {
        &self.outcome
    }

    #[must_use]
    pub const fn request(&self) -> &PreviewRequest {
        &self.request
    }
}

impl PendingLoad {
    #[must_use]
    pub const fn request(&self) -> &PreviewRequest {
        &self.request
    }

    #[must_use]
    pub const fn token(&self) -> &LoadToken {
        &self.token
    }

    /// Fetch the request's bytes, racing the attempt's cancellation
    ///
    /// Types that need no bytes skip the fetch entirely.
    pub async fn fetch(self) -> FetchedLoad {
        let family = self.request.declared_type().family();
        let outcome = if !family.needs_bytes() {
            FetchOutcome::Skipped
        } else if self.token.is_cancelled() {
            FetchOutcome::Cancelled
        } else {
            tokio::select! {
                biased;
                () = self.token.cancelled() => FetchOutcome::Cancelled,
                result = self.fetcher.fetch(self.request.source_url(), self.max_file_size) => match result {
                    Ok(bytes) => FetchOutcome::Fetched(bytes),
                    Err(e) => FetchOutcome::Failed(e),
                },
            }
        };

        FetchedLoad {
            request: self.request,
            token: self.token,
            outcome,
        }
    }
}

impl PreviewPane {
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_max_file_size(fetcher, DEFAULT_MAX_FILE_SIZE)
    }

    #[must_use]
    pub fn with_max_file_size(fetcher: Arc<dyn Fetcher>, max_file_size: u64) -> Self {
        Self {
            fetcher,
            max_file_size,
            state: PreviewState::new(),
            surface: RenderSurface::new(),
            request: None,
            live: None,
            attempts: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &PreviewState {
        &self.state
    }

    #[must_use]
    pub const fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    /// Request currently shown (or loading)
    #[must_use]
    pub const fn request(&self) -> Option<&PreviewRequest> {
        self.request.as_ref()
    }

    /// Start a load attempt, superseding any attempt in flight
    ///
    /// The previous surface is cleared and the state reset immediately.
    pub fn begin(&mut self, request: PreviewRequest) -> PendingLoad {
        self.release();

        self.attempts += 1;
        let token = LoadToken::new(self.attempts);
        debug!(
            attempt = self.attempts,
            source = request.source_url(),
            kind = %request.declared_type(),
            "preview load started"
        );

        self.state.begin();
        self.live = Some(token.clone());
        self.request = Some(request.clone());

        PendingLoad {
            request,
            token,
            fetcher: Arc::clone(&self.fetcher),
            max_file_size: self.max_file_size,
        }
    }

    /// Apply a fetched load
    ///
    /// Returns `false`, leaving the pane untouched, when the load belongs to
    /// an attempt that has since been superseded or unmounted.
    pub fn complete(&mut self, fetched: FetchedLoad) -> bool {
        if !self.is_live(&fetched.token) {
            debug!(
                attempt = fetched.token.generation(),
                "discarding stale preview result"
            );
            return false;
        }

        let FetchedLoad {
            request,
            token,
            outcome,
        } = fetched;

        match outcome {
            FetchOutcome::Cancelled => return false,
            FetchOutcome::Failed(err) => {
                warn!(source = request.source_url(), error = %err, "preview fetch failed");
                self.state.fail(&PreviewError::from(err));
            }
            FetchOutcome::Skipped => self.present(&request),
            FetchOutcome::Fetched(bytes) => {
                if let Err(err) = self.render(&request, bytes) {
                    warn!(source = request.source_url(), error = %err, "preview render failed");
                    self.state.fail(&err);
                }
            }
        }

        self.live = None;
        info!(
            attempt = token.generation(),
            name = request.display_name(),
            error = self.state.error(),
            "preview load finished"
        );
        true
    }

    /// Begin, fetch and complete a request
    pub async fn load(&mut self, request: PreviewRequest) -> &PreviewState {
        let pending = self.begin(request);
        let fetched = pending.fetch().await;
        self.complete(fetched);
        &self.state
    }

    /// Make sheet `index` active without fetching again
    ///
    /// # Errors
    ///
    /// Returns [`PreviewError::SheetOutOfRange`] if `index` is not a loaded
    /// sheet; the active sheet is unchanged.
    pub fn select_sheet(&mut self, index: usize) -> Result<&Sheet> {
        self.state.select_sheet(index)
    }

    #[must_use]
    pub fn active_sheet(&self) -> Option<&Sheet> {
        self.state.active_sheet()
    }

    #[must_use]
    pub fn active_rows(&self) -> &[Row] {
        self.state.active_rows()
    }

    /// Tear the pane down: cancel, clear the surface, forget the request
    pub fn unmount(&mut self) {
        self.release();
        self.request = None;
        self.state.reset();
    }

    fn release(&mut self) {
        if let Some(token) = self.live.take() {
            debug!(attempt = token.generation(), "cancelling in-flight preview load");
            token.cancel();
        }
        self.surface.clear();
    }

    fn is_live(&self, token: &LoadToken) -> bool {
        !token.is_cancelled()
            && self
                .live
                .as_ref()
                .is_some_and(|live| live.same_attempt(token))
    }

    /// Outcome for families that need no bytes
    fn present(&mut self, request: &PreviewRequest) {
        match request.declared_type().family() {
            FormatFamily::Embed => self.surface.mount_embed(request.source_url()),
            FormatFamily::Unsupported
            | FormatFamily::Document
            | FormatFamily::Spreadsheet
            | FormatFamily::Delimited => {}
        }
        self.state.settle();
    }

    fn render(&mut self, request: &PreviewRequest, bytes: Vec<u8>) -> Result<()> {
        let size = bytes.len() as u64;
        if size > self.max_file_size {
            return Err(PreviewError::FileTooLarge(size, self.max_file_size));
        }

        let family = request.declared_type().family();
        debug!(?family, size, "dispatching fetched bytes");

        match family {
            FormatFamily::Document => {
                docx::render_into(&bytes, self.max_file_size, &mut self.surface)?;
                self.state.settle();
            }
            FormatFamily::Spreadsheet => {
                let sheets = workbook::parse(bytes)?;
                self.state.show_sheets(sheets);
            }
            FormatFamily::Delimited => {
                let sheet = delimited::parse_bytes(&bytes);
                self.state.show_sheets(vec![sheet]);
            }
            FormatFamily::Embed | FormatFamily::Unsupported => self.present(request),
        }
        Ok(())
    }
}
