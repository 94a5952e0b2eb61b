use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::info;
use resume_pager::export::{self, CancellationToken, ExportOptions};
use resume_pager::geometry::PageGeometry;
use resume_pager::model::ContentBlock;
use resume_pager::oracle;
use resume_pager::planner;
use resume_pager::raster::WireframeRasterizer;

/// Paginates measured résumé layouts and exports them to PDF.
///
/// Block models are JSON documents produced by the editor's measurement pass.
/// Logging follows `RUST_LOG` (for example `RUST_LOG=resume_pager=debug`).
#[derive(Parser)]
#[command(author, version, about = "Pagination and PDF export for measured résumé layouts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the pagination plan of a block model as JSON.
    Plan {
        /// Path to the block model JSON file.
        model: PathBuf,
        #[command(flatten)]
        geometry: GeometryArgs,
    },

    /// Export a wireframe preview PDF showing where every block lands.
    Export {
        /// Path to the block model JSON file.
        model: PathBuf,
        /// Output PDF path.
        #[arg(short, long, default_value = "resume.pdf")]
        output: PathBuf,
        /// Title stored in the PDF metadata.
        #[arg(long, default_value = "Resume")]
        title: String,
        /// Add an outline entry for every labelled section.
        #[cfg(feature = "bookmarks")]
        #[arg(long)]
        bookmarks: bool,
        #[command(flatten)]
        geometry: GeometryArgs,
    },

    /// Print the print-path stylesheet derived from the break rules.
    #[command(name = "stylesheet", aliases = ["css"])]
    Stylesheet,
}

#[derive(Args)]
struct GeometryArgs {
    /// Page width in millimetres.
    #[arg(long, env = "RESUME_PAGER_PAGE_WIDTH_MM", default_value_t = 210.0)]
    page_width_mm: f64,
    /// Page height in millimetres.
    #[arg(long, env = "RESUME_PAGER_PAGE_HEIGHT_MM", default_value_t = 297.0)]
    page_height_mm: f64,
    /// Uniform page margin in millimetres.
    #[arg(long, env = "RESUME_PAGER_MARGIN_MM", default_value_t = 12.0)]
    margin_mm: f64,
    /// Rasterization density.
    #[arg(long, env = "RESUME_PAGER_SCALE", default_value_t = 3.0)]
    scale: f64,
    /// Vertical spacing between blocks, in logical pixels.
    #[arg(long, env = "RESUME_PAGER_SPACING_PX", default_value_t = 0.0)]
    spacing_px: f64,
}

impl GeometryArgs {
    fn to_geometry(&self) -> PageGeometry {
        PageGeometry::new()
            .with_page_size(self.page_width_mm, self.page_height_mm)
            .with_margin_mm(self.margin_mm)
            .with_scale(self.scale)
            .with_block_spacing_px(self.spacing_px)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Err(err) = run(cli.command) {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Plan { model, geometry } => {
            let root = load_model(&model)?;
            let plan = planner::plan(&root, &geometry.to_geometry())?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Commands::Export {
            model,
            output,
            title,
            #[cfg(feature = "bookmarks")]
            bookmarks,
            geometry,
        } => {
            let root = load_model(&model)?;
            let options = ExportOptions::new()
                .with_geometry(geometry.to_geometry())
                .with_title(title);
            #[cfg(feature = "bookmarks")]
            let options = options.with_bookmarks(bookmarks);

            let pdf = export::export(
                &root,
                &options,
                &WireframeRasterizer::new(),
                &CancellationToken::new(),
            )?;
            fs::write(&output, &pdf.bytes)?;
            info!("wrote {}", output.display());
            println!(
                "Generated {} ({} pages, {} bytes)",
                output.display(),
                pdf.page_count,
                pdf.bytes.len()
            );
        }
        Commands::Stylesheet => print!("{}", oracle::print_stylesheet()),
    }
    Ok(())
}

fn load_model(path: &Path) -> Result<ContentBlock, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    let root = serde_json::from_str(&text)
        .map_err(|err| format!("failed to parse {}: {}", path.display(), err))?;
    Ok(root)
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
