//! End-to-end export: plan, rasterize, assemble.
//!
//! [`export`] is the unit of work the editor triggers. It either returns the
//! finished PDF or an error; intermediate plans, rasters and partially
//! encoded documents are dropped on every failure path, including
//! cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};

use crate::assembler::{self, PdfOutput};
use crate::error::{ExportError, Result};
use crate::geometry::PageGeometry;
use crate::model::ContentBlock;
use crate::planner;
use crate::raster::{self, PageRasterizer};

const DEFAULT_TITLE: &str = "Resume";

/// Cooperative cancellation flag shared between the caller and an export.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; the export stops at its next checkpoint.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ExportError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Settings for one export run.
#[derive(Clone, Debug)]
pub struct ExportOptions {
    geometry: PageGeometry,
    title: String,
    #[cfg(feature = "bookmarks")]
    bookmarks: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::default(),
            title: DEFAULT_TITLE.to_string(),
            #[cfg(feature = "bookmarks")]
            bookmarks: false,
        }
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page geometry.
    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Sets the document title stored in the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Adds an outline entry for every labelled section.
    #[cfg(feature = "bookmarks")]
    pub fn with_bookmarks(mut self, bookmarks: bool) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Exports `root` to PDF.
///
/// `cancel` is checked after planning, before each page is rasterized, and
/// before assembly. The block model is only read.
pub fn export<R>(
    root: &ContentBlock,
    options: &ExportOptions,
    rasterizer: &R,
    cancel: &CancellationToken,
) -> Result<PdfOutput>
where
    R: PageRasterizer + ?Sized,
{
    let geometry = options.geometry();
    let plan = planner::plan(root, geometry)?;
    debug!("export plan has {} pages", plan.page_count());
    cancel.checkpoint()?;

    let pages = raster::rasterize_pages(&plan, geometry, rasterizer, cancel)?;
    cancel.checkpoint()?;

    let output = assembler::assemble(pages, geometry, options.title())?;

    #[cfg(feature = "bookmarks")]
    let output = if options.bookmarks {
        let anchors = plan.section_anchors(root);
        let bytes = crate::bookmarks::apply_section_bookmarks(&output.bytes, &anchors)?;
        PdfOutput {
            bytes,
            page_count: output.page_count,
        }
    } else {
        output
    };

    info!(
        "exported {} pages ({} bytes)",
        output.page_count,
        output.bytes.len()
    );
    Ok(output)
}
