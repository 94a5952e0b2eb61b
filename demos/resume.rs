#[path = "shared/sample_resume.rs"]
mod sample_resume;

use std::error::Error;

use resume_pager::export::{export, CancellationToken, ExportOptions};
use resume_pager::geometry::PageGeometry;
use resume_pager::raster::WireframeRasterizer;

fn main() -> Result<(), Box<dyn Error>> {
    let resume = sample_resume::build_sample_resume();
    let options = ExportOptions::new()
        .with_geometry(PageGeometry::default().with_block_spacing_px(sample_resume::SPACING_PX))
        .with_title("Sample Resume");

    let pdf = export(&resume, &options, &WireframeRasterizer::new(), &CancellationToken::new())?;
    std::fs::write("resume.pdf", &pdf.bytes)?;
    println!(
        "Generated resume.pdf ({} pages, {} bytes)",
        pdf.page_count,
        pdf.bytes.len()
    );
    Ok(())
}
