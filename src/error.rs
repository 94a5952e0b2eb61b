//! Error types for the export pipeline.

use thiserror::Error;

use crate::raster::RasterError;

/// Result type alias for resume_pager operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Failures of a single export operation.
///
/// None of them touch the block model, and no variant carries a partially
/// built PDF.
#[derive(Error, Debug)]
pub enum ExportError {
    /// A container height does not match its children; the caller must
    /// re-measure and retry.
    #[error("stale measurement for block `{id}`: children add up to {expected_px}px but {measured_px}px was measured")]
    StaleMeasurement {
        /// Identifier of the inconsistent container.
        id: String,
        /// Height implied by the visible children.
        expected_px: f64,
        /// Height reported by the measurement pass.
        measured_px: f64,
    },

    /// A block height is negative, NaN or infinite.
    #[error("block `{id}` has an invalid height of {height_px}px")]
    InvalidHeight {
        /// Identifier of the offending block.
        id: String,
        /// The reported height.
        height_px: f64,
    },

    /// Two blocks share an identifier.
    #[error("block id `{0}` is used more than once")]
    DuplicateBlockId(String),

    /// The page geometry cannot hold any content.
    #[error("invalid page geometry: {0}")]
    InvalidGeometry(String),

    /// There is nothing to paginate or assemble.
    #[error("document has no content to paginate")]
    EmptyDocument,

    /// The rasterizer failed for one page; assembly was abandoned.
    #[error("failed to rasterize page {page_index}")]
    RasterizationFailure {
        /// Page that could not be rasterized.
        page_index: usize,
        /// Error reported by the rasterizer.
        #[source]
        source: RasterError,
    },

    /// Raster pages were not a contiguous `0..n` sequence.
    #[error("expected raster for page {expected}, found page {found}")]
    PageOrder {
        /// Page index the assembler was waiting for.
        expected: usize,
        /// Page index it received instead.
        found: usize,
    },

    /// A raster arrived with a scale that cannot be mapped to a DPI.
    #[error("raster for page {page_index} has an invalid scale of {scale}")]
    InvalidRasterScale {
        /// Page the raster belongs to.
        page_index: usize,
        /// The reported scale.
        scale: f64,
    },

    /// The PDF container could not be serialized.
    #[error("PDF encoding error: {0}")]
    Encode(String),

    /// The export was cancelled by the caller.
    #[error("export cancelled")]
    Cancelled,

    /// Section bookmarks could not be added to the rendered PDF.
    #[cfg(feature = "bookmarks")]
    #[error("failed to add section bookmarks")]
    Bookmarks(#[from] crate::bookmarks::BookmarkError),
}
