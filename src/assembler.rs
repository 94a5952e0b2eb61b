//! Places rasterized pages into a multi-page PDF.
//!
//! The assembler takes no layout decisions: every [`RasterImage`] becomes one
//! page of the configured size, with the image's top-left corner at the
//! margin. Pixel sizes map to millimetres through the 96 DPI logical grid, so
//! a raster rendered at `scale`× is embedded at `96 · scale` DPI and keeps its
//! logical size on paper.

use std::io::BufWriter;

use image::{DynamicImage, GenericImageView};
use log::{debug, warn};
use printpdf::{Image, Mm, PdfDocument, PdfDocumentReference};

use crate::error::{ExportError, Result};
use crate::geometry::{PageGeometry, DPI, MM_PER_INCH};
use crate::raster::RasterImage;

/// Serialized PDF produced by [`assemble`].
#[derive(Clone, Debug)]
pub struct PdfOutput {
    /// The complete PDF file.
    pub bytes: Vec<u8>,
    /// Number of pages in the file.
    pub page_count: usize,
}

/// Physical position of a page image, in millimetres.
///
/// `x_mm`/`y_mm` use the PDF convention: the offset of the image's
/// bottom-left corner from the bottom-left corner of the page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImagePlacement {
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
    pub dpi: f64,
}

/// Computes where an image of `width_px × height_px` pixels, rendered at
/// `scale`, lands on a page of `geometry`.
pub fn image_placement(
    width_px: u32,
    height_px: u32,
    scale: f64,
    geometry: &PageGeometry,
) -> ImagePlacement {
    let dpi = DPI * scale;
    let width_mm = width_px as f64 / dpi * MM_PER_INCH;
    let height_mm = height_px as f64 / dpi * MM_PER_INCH;
    ImagePlacement {
        x_mm: geometry.margin_mm(),
        y_mm: geometry.page_height_mm() - geometry.margin_mm() - height_mm,
        width_mm,
        height_mm,
        dpi,
    }
}

/// Builds a PDF with one page per raster image.
///
/// `pages` must hold exactly the indices `0..n`, in any order; they are
/// appended in index order. The PDF is encoded into a private buffer and only
/// returned once complete.
pub fn assemble(
    pages: Vec<RasterImage>,
    geometry: &PageGeometry,
    title: &str,
) -> Result<PdfOutput> {
    if pages.is_empty() {
        return Err(ExportError::EmptyDocument);
    }
    geometry.validate()?;

    let mut pages = pages;
    pages.sort_by_key(RasterImage::page_index);
    for (expected, page) in pages.iter().enumerate() {
        if page.page_index() != expected {
            return Err(ExportError::PageOrder {
                expected,
                found: page.page_index(),
            });
        }
        if !page.scale().is_finite() || page.scale() <= 0.0 {
            return Err(ExportError::InvalidRasterScale {
                page_index: page.page_index(),
                scale: page.scale(),
            });
        }
    }

    let page_count = pages.len();
    let width = Mm(geometry.page_width_mm());
    let height = Mm(geometry.page_height_mm());
    let (document, first_page, first_layer) =
        PdfDocument::new(title, width, height, layer_name(0));

    let mut targets = Vec::with_capacity(page_count);
    targets.push((first_page, first_layer));
    for index in 1..page_count {
        targets.push(document.add_page(width, height, layer_name(index)));
    }

    for (raster, (page_index, layer_index)) in pages.into_iter().zip(targets) {
        let number = raster.page_index();
        let scale = raster.scale();
        let image = fit_content_area(raster, geometry);
        let placement = image_placement(image.width(), image.height(), scale, geometry);
        debug!(
            "placing page {} image {}x{}px at ({:.2}, {:.2})mm",
            number,
            image.width(),
            image.height(),
            placement.x_mm,
            placement.y_mm
        );

        let layer = document.get_page(page_index).get_layer(layer_index);
        Image::from_dynamic_image(&image).add_to_layer(
            layer,
            Some(Mm(placement.x_mm)),
            Some(Mm(placement.y_mm)),
            None,
            None,
            None,
            Some(placement.dpi),
        );
    }

    let bytes = encode(document)?;
    debug!("assembled {} pages into {} bytes", page_count, bytes.len());
    Ok(PdfOutput { bytes, page_count })
}

fn layer_name(index: usize) -> String {
    format!("Page {}", index + 1)
}

/// Crops a raster that extends past the content area and drops the alpha
/// channel, which the PDF image encoder does not carry over.
fn fit_content_area(raster: RasterImage, geometry: &PageGeometry) -> DynamicImage {
    let scale = raster.scale();
    let page_index = raster.page_index();
    let image = raster.into_image();

    let max_width = (geometry.content_width_px() * scale).round() as u32;
    let max_height = (geometry.content_height_px() * scale).round() as u32;
    let (width, height) = image.dimensions();

    let image = if width > max_width || height > max_height {
        warn!(
            "page {} raster is {}x{}px but the content area is {}x{}px; cropping the overflow",
            page_index, width, height, max_width, max_height
        );
        image.crop_imm(0, 0, width.min(max_width), height.min(max_height))
    } else {
        image
    };

    match image {
        DynamicImage::ImageRgb8(buffer) => DynamicImage::ImageRgb8(buffer),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

fn encode(document: PdfDocumentReference) -> Result<Vec<u8>> {
    let mut writer = BufWriter::new(Vec::new());
    document
        .save(&mut writer)
        .map_err(|err| ExportError::Encode(format!("{err:?}")))?;
    writer
        .into_inner()
        .map_err(|err| ExportError::Encode(err.to_string()))
}
