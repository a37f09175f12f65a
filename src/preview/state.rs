//! Preview pane view-model

use super::error::{PreviewError, Result};
use super::types::{Row, Sheet, SheetCollection};
use serde::Serialize;

/// Mutable view-model owned by a preview pane
///
/// Only the transition methods below mutate it. `active_sheet_index` is
/// always a valid index into `sheets`, or 0 when there are none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreviewState {
    loading: bool,
    error: Option<String>,
    active_sheet_index: usize,
    sheets: SheetCollection,
}

impl PreviewState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub const fn active_sheet_index(&self) -> usize {
        self.active_sheet_index
    }

    #[must_use]
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    #[must_use]
    pub fn active_sheet(&self) -> Option<&Sheet> {
        self.sheets.get(self.active_sheet_index)
    }

    /// Rows of the active sheet, empty when nothing is loaded
    #[must_use]
    pub fn active_rows(&self) -> &[Row] {
        match self.active_sheet() {
            Some(sheet) => &sheet.rows,
            None => &[],
        }
    }

    /// Whether a sheet-switch affordance makes sense
    #[must_use]
    pub fn has_multiple_sheets(&self) -> bool {
        self.sheets.len() > 1
    }

    /// Start of a load attempt
    pub(crate) fn begin(&mut self) {
        self.loading = true;
        self.error = None;
        self.sheets.clear();
        self.active_sheet_index = 0;
    }

    pub(crate) fn fail(&mut self, error: &PreviewError) {
        self.loading = false;
        self.error = Some(error.to_string());
    }

    /// Finish with a rendered surface or no transformation
    pub(crate) fn settle(&mut self) {
        self.loading = false;
    }

    pub(crate) fn show_sheets(&mut self, sheets: SheetCollection) {
        self.sheets = sheets;
        self.active_sheet_index = 0;
        self.loading = false;
    }

    /// Back to the state of a pane that never loaded anything
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Make sheet `index` active
    ///
    /// # Errors
    ///
    /// Returns [`PreviewError::SheetOutOfRange`] and leaves the state as it
    /// was if `index` is not a loaded sheet.
    pub fn select_sheet(&mut self, index: usize) -> Result<&Sheet> {
        let len = self.sheets.len();
        if index >= len {
            return Err(PreviewError::SheetOutOfRange { index, len });
        }
        self.active_sheet_index = index;
        Ok(&self.sheets[index])
    }
}
