//! Boundary to the component that turns page content into bitmaps.
//!
//! The engine does not know how blocks look; it hands a [`SourceRegion`] per
//! page to a [`PageRasterizer`] and receives a [`RasterImage`] back. Pages are
//! independent, so [`rasterize_pages`] fans the calls out over the rayon
//! thread pool and collects them back in page order.

use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb};
use log::debug;
use rayon::prelude::*;
use thiserror::Error;

use crate::error::{ExportError, Result};
use crate::export::CancellationToken;
use crate::geometry::PageGeometry;
use crate::model::BlockKind;
use crate::planner::{PagePlan, PaginationPlan, Placement};

/// The content of one page as seen by the rasterizer.
///
/// Coordinates are logical pixels relative to the top-left corner of the
/// content area.
#[derive(Clone, Copy, Debug)]
pub struct SourceRegion<'a> {
    pub page_index: usize,
    pub placements: &'a [Placement],
    pub width_px: f64,
    pub height_px: f64,
}

impl<'a> SourceRegion<'a> {
    /// Builds the region for `page`; overflowing pages extend past the content
    /// area so the oversized block is rendered in full.
    pub fn for_page(page: &'a PagePlan, geometry: &PageGeometry) -> Self {
        Self {
            page_index: page.page_index(),
            placements: page.placements(),
            width_px: geometry.content_width_px(),
            height_px: page.used_height_px().max(geometry.content_height_px()),
        }
    }

    /// Pixel dimensions of the bitmap expected at `scale`.
    pub fn pixel_size(&self, scale: f64) -> (u32, u32) {
        (
            (self.width_px * scale).round().max(1.0) as u32,
            (self.height_px * scale).round().max(1.0) as u32,
        )
    }
}

/// A rasterized page.
#[derive(Clone, Debug)]
pub struct RasterImage {
    page_index: usize,
    scale: f64,
    image: DynamicImage,
}

impl RasterImage {
    /// Wraps a bitmap rendered at `scale`× logical density.
    pub fn new(page_index: usize, scale: f64, image: DynamicImage) -> Self {
        Self {
            page_index,
            scale,
            image,
        }
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }

    /// Width in logical pixels.
    pub fn logical_width_px(&self) -> f64 {
        self.image.width() as f64 / self.scale
    }

    /// Height in logical pixels.
    pub fn logical_height_px(&self) -> f64 {
        self.image.height() as f64 / self.scale
    }
}

/// Error reported by a [`PageRasterizer`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RasterError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl RasterError {
    /// Creates an error carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error that wraps the underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Renders the placements of one page into a bitmap.
///
/// Implementations must paint only the blocks listed in the region and must
/// not draw content that belongs to neighbouring pages. `scale` changes pixel
/// density only; block offsets are logical pixels.
pub trait PageRasterizer: Sync {
    fn rasterize(
        &self,
        region: &SourceRegion<'_>,
        scale: f64,
    ) -> std::result::Result<RasterImage, RasterError>;
}

/// Rasterizes every page of `plan` in parallel.
///
/// The result is ordered by page index. The first failure aborts the batch
/// and is reported as [`ExportError::RasterizationFailure`]; pages that start
/// after `cancel` fired are not rasterized and the call returns
/// [`ExportError::Cancelled`].
pub fn rasterize_pages<R>(
    plan: &PaginationPlan,
    geometry: &PageGeometry,
    rasterizer: &R,
    cancel: &CancellationToken,
) -> Result<Vec<RasterImage>>
where
    R: PageRasterizer + ?Sized,
{
    let scale = geometry.scale();
    plan.pages()
        .par_iter()
        .map(|page| {
            if cancel.is_cancelled() {
                return Err(ExportError::Cancelled);
            }
            let region = SourceRegion::for_page(page, geometry);
            debug!(
                "rasterizing page {} ({} blocks) at {}x",
                region.page_index,
                region.placements.len(),
                scale
            );
            rasterizer
                .rasterize(&region, scale)
                .map_err(|source| ExportError::RasterizationFailure {
                    page_index: region.page_index,
                    source,
                })
        })
        .collect()
}

const PAGE_BACKGROUND: [u8; 3] = [255, 255, 255];
const BLOCK_INSET_PX: f64 = 2.0;
const BORDER_PX: f64 = 1.0;

/// Reference rasterizer that paints every placement as a shaded box.
///
/// It stands in for the real renderer in previews and tests: the output shows
/// exactly where each block lands without needing the visual content.
#[derive(Clone, Copy, Debug, Default)]
pub struct WireframeRasterizer;

impl WireframeRasterizer {
    pub fn new() -> Self {
        Self
    }

    fn fill_for(kind: BlockKind) -> [u8; 3] {
        match kind {
            BlockKind::SectionHeader => [78, 102, 148],
            BlockKind::Item => [200, 220, 255],
            BlockKind::SkillGroup => [244, 206, 118],
            BlockKind::HighlightItem => [228, 188, 152],
            BlockKind::Leaf => [225, 225, 225],
            BlockKind::Container | BlockKind::Section => [240, 240, 240],
        }
    }
}

impl PageRasterizer for WireframeRasterizer {
    fn rasterize(
        &self,
        region: &SourceRegion<'_>,
        scale: f64,
    ) -> std::result::Result<RasterImage, RasterError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(RasterError::new(format!("unsupported scale {scale}")));
        }

        let (width, height) = region.pixel_size(scale);
        let inset = BLOCK_INSET_PX * scale;
        let border = BORDER_PX * scale;
        let right = width as f64 - inset;

        let buffer = ImageBuffer::from_fn(width, height, |x, y| {
            let xf = x as f64 + 0.5;
            let yf = y as f64 + 0.5;
            if xf < inset || xf > right {
                return Rgb(PAGE_BACKGROUND);
            }
            let hit = region.placements.iter().find(|placement| {
                let top = placement.y_offset_px() * scale;
                let bottom = placement.bottom_px() * scale;
                yf >= top && yf < bottom
            });
            match hit {
                Some(placement) => {
                    let top = placement.y_offset_px() * scale;
                    let bottom = placement.bottom_px() * scale;
                    let on_border = yf - top < border
                        || bottom - yf < border
                        || xf - inset < border
                        || right - xf < border;
                    if on_border {
                        Rgb([60, 60, 60])
                    } else {
                        Rgb(Self::fill_for(placement.kind()))
                    }
                }
                None => Rgb(PAGE_BACKGROUND),
            }
        });

        Ok(RasterImage::new(
            region.page_index,
            scale,
            DynamicImage::ImageRgb8(buffer),
        ))
    }
}
