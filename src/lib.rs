//! Core entry point for the resume_pager crate.
//!
//! The crate turns a measured résumé layout ([`model::ContentBlock`]) into a
//! paginated PDF: [`planner::plan`] decides page breaks, a
//! [`raster::PageRasterizer`] turns each page into a bitmap, and
//! [`assembler::assemble`] places the bitmaps into PDF pages. [`export::export`]
//! runs all three steps as one unit of work.

pub mod assembler;
pub mod error;
pub mod export;
pub mod geometry;
pub mod model;
pub mod oracle;
pub mod planner;
pub mod raster;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

pub use error::{ExportError, Result};
