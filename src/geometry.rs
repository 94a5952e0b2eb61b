//! Physical page configuration for an export run.

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};

/// Logical pixels per inch assumed by the measurement pass.
pub const DPI: f64 = 96.0;

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

const DEFAULT_PAGE_WIDTH_MM: f64 = 210.0;
const DEFAULT_PAGE_HEIGHT_MM: f64 = 297.0;
const DEFAULT_MARGIN_MM: f64 = 12.0;
const DEFAULT_SCALE: f64 = 3.0;

/// Page size, margins and raster density shared by every step of one export.
///
/// Defaults to A4 with a 12 mm margin, rasterized at 3× density. `scale` only
/// affects the sharpness of page images; pagination always runs on logical
/// pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageGeometry {
    page_width_mm: f64,
    page_height_mm: f64,
    margin_mm: f64,
    scale: f64,
    block_spacing_px: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_width_mm: DEFAULT_PAGE_WIDTH_MM,
            page_height_mm: DEFAULT_PAGE_HEIGHT_MM,
            margin_mm: DEFAULT_MARGIN_MM,
            scale: DEFAULT_SCALE,
            block_spacing_px: 0.0,
        }
    }
}

impl PageGeometry {
    /// Creates the default A4 geometry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a geometry whose content area is `content_height_px` logical
    /// pixels tall, keeping the default width and margin.
    ///
    /// The page height is stored in millimetres, so `content_height_px()` can
    /// differ from the request by a rounding error. The planner absorbs that
    /// in its fit checks; tests comparing against the content height should
    /// allow the same slack.
    pub fn with_content_height_px(content_height_px: f64) -> Self {
        let geometry = Self::default();
        let page_height_mm = content_height_px / px_per_mm() + 2.0 * geometry.margin_mm;
        geometry.with_page_size(geometry.page_width_mm, page_height_mm)
    }

    /// Sets the page size in millimetres.
    pub fn with_page_size(mut self, width_mm: f64, height_mm: f64) -> Self {
        self.page_width_mm = width_mm;
        self.page_height_mm = height_mm;
        self
    }

    /// Sets the uniform page margin in millimetres.
    pub fn with_margin_mm(mut self, margin_mm: f64) -> Self {
        self.margin_mm = margin_mm;
        self
    }

    /// Sets the rasterization density.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the vertical spacing inserted between consecutive blocks.
    pub fn with_block_spacing_px(mut self, spacing_px: f64) -> Self {
        self.block_spacing_px = spacing_px;
        self
    }

    pub fn page_width_mm(&self) -> f64 {
        self.page_width_mm
    }

    pub fn page_height_mm(&self) -> f64 {
        self.page_height_mm
    }

    pub fn margin_mm(&self) -> f64 {
        self.margin_mm
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn block_spacing_px(&self) -> f64 {
        self.block_spacing_px
    }

    /// Logical pixels per millimetre.
    pub fn px_per_mm(&self) -> f64 {
        px_per_mm()
    }

    /// Height of the area inside the margins, in logical pixels.
    pub fn content_height_px(&self) -> f64 {
        (self.page_height_mm - 2.0 * self.margin_mm) * px_per_mm()
    }

    /// Width of the area inside the margins, in logical pixels.
    pub fn content_width_px(&self) -> f64 {
        (self.page_width_mm - 2.0 * self.margin_mm) * px_per_mm()
    }

    /// Checks that the geometry leaves a usable content area.
    pub fn validate(&self) -> Result<()> {
        let finite = [
            self.page_width_mm,
            self.page_height_mm,
            self.margin_mm,
            self.scale,
            self.block_spacing_px,
        ]
        .iter()
        .all(|value| value.is_finite());
        if !finite {
            return Err(ExportError::InvalidGeometry(
                "all dimensions must be finite numbers".to_string(),
            ));
        }
        if self.page_width_mm <= 0.0 || self.page_height_mm <= 0.0 {
            return Err(ExportError::InvalidGeometry(format!(
                "page size {}x{}mm must be positive",
                self.page_width_mm, self.page_height_mm
            )));
        }
        if self.margin_mm < 0.0 {
            return Err(ExportError::InvalidGeometry(format!(
                "margin {}mm must not be negative",
                self.margin_mm
            )));
        }
        if self.content_height_px() <= 0.0 || self.content_width_px() <= 0.0 {
            return Err(ExportError::InvalidGeometry(format!(
                "margin {}mm leaves no content area on a {}x{}mm page",
                self.margin_mm, self.page_width_mm, self.page_height_mm
            )));
        }
        if self.scale <= 0.0 {
            return Err(ExportError::InvalidGeometry(format!(
                "scale {} must be positive",
                self.scale
            )));
        }
        if self.block_spacing_px < 0.0 {
            return Err(ExportError::InvalidGeometry(format!(
                "block spacing {}px must not be negative",
                self.block_spacing_px
            )));
        }
        Ok(())
    }
}

fn px_per_mm() -> f64 {
    DPI / MM_PER_INCH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_a4_with_twelve_mm_margin() {
        let geometry = PageGeometry::default();
        assert_eq!(geometry.page_width_mm(), 210.0);
        assert_eq!(geometry.page_height_mm(), 297.0);
        assert_eq!(geometry.margin_mm(), 12.0);
        assert_eq!(geometry.scale(), 3.0);
        let expected = (297.0 - 24.0) * 96.0 / 25.4;
        assert!((geometry.content_height_px() - expected).abs() < 1e-9);
    }

    #[test]
    fn content_height_constructor_round_trips() {
        let geometry = PageGeometry::with_content_height_px(250.0);
        assert!((geometry.content_height_px() - 250.0).abs() < 1e-9);
        assert!(geometry.validate().is_ok());
    }

    #[test]
    fn rejects_margins_that_swallow_the_page() {
        let geometry = PageGeometry::default().with_margin_mm(120.0);
        assert!(matches!(
            geometry.validate(),
            Err(ExportError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn rejects_non_positive_scale() {
        let geometry = PageGeometry::default().with_scale(0.0);
        assert!(geometry.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let geometry: PageGeometry =
            serde_json::from_str(r#"{"marginMm": 20}"#).expect("valid geometry json");
        assert_eq!(geometry.margin_mm(), 20.0);
        assert_eq!(geometry.page_height_mm(), 297.0);
    }
}
