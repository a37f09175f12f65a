//! Owned output buffer for rendered content

use super::types::Document;
use serde::Serialize;

/// Content mounted on a [`RenderSurface`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SurfaceContent {
    /// Converted word-processor document
    Document { document: Document },
    /// Source displayed natively by the host (PDF)
    Embed { url: String },
}

/// Render target handed to document renderers
///
/// The pane owns one surface and clears it whenever a request is superseded
/// or the pane is unmounted, so content from an old load never lingers.
#[derive(Debug, Default, Serialize)]
pub struct RenderSurface {
    content: Option<SurfaceContent>,
}

impl RenderSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop whatever is mounted
    pub fn clear(&mut self) {
        self.content = None;
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.content.is_none()
    }

    #[must_use]
    pub const fn content(&self) -> Option<&SurfaceContent> {
        self.content.as_ref()
    }

    pub fn mount_document(&mut self, document: Document) {
        self.content = Some(SurfaceContent::Document { document });
    }

    pub fn mount_embed(&mut self, url: impl Into<String>) {
        self.content = Some(SurfaceContent::Embed { url: url.into() });
    }

    /// Mounted document, if the surface holds one
    #[must_use]
    pub fn document(&self) -> Option<&Document> {
        match &self.content {
            Some(SurfaceContent::Document { document }) => Some(document),
            _ => None,
        }
    }
}
