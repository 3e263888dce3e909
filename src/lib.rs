//! # Panelcraft
//!
//! A comic page composition engine.
//!
//! A story arrives as a flat list of panels. Panelcraft decides where each
//! panel sits on a page, how its artwork is cropped to the slot it lands in,
//! where its speech bubbles float, and finally rasterizes every page into a
//! print-ready A4 PDF.
//!
//! The interactive preview and the PDF export read the same state and run
//! the same geometry. A crop or a bubble placed on screen lands in the same
//! spot on paper; only the resolution differs.
//!
//! ## Architecture
//!
//! ```text
//! Project (JSON/API)
//!       ↓
//!   [model]    Panels, templates, page assignments, export options
//!       ↓
//!   [layout]   Split trees, template library, panels onto pages
//!       ↓
//!   [crop] [bubble]   Cover-fit source windows, bubble geometry
//!       ↓                         ↘
//!   [preview]  Screen display list    [export] Page canvases ([raster])
//!                                          ↓
//!                                     [pdf]   Serialize to PDF bytes
//! ```

pub mod error;
pub mod geometry;
pub mod style;
pub mod model;
pub mod layout;
pub mod crop;
pub mod bubble;
pub mod interact;
pub mod raster;
pub mod image_loader;
pub mod pdf;
pub mod export;
pub mod preview;
pub mod generation;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{PanelcraftError, Result};

use export::NoHooks;
use image_loader::ImageFetcher;
use model::ComicProject;

/// Fetcher used when the caller does not supply one: HTTP with the default
/// `http` feature, local sources only without it (WASM builds).
pub fn default_fetcher() -> Box<dyn ImageFetcher> {
    #[cfg(feature = "http")]
    {
        Box::new(image_loader::HttpFetcher::new())
    }
    #[cfg(not(feature = "http"))]
    {
        Box::new(image_loader::NoFetcher)
    }
}

/// Render a project to PDF bytes.
///
/// This is the primary entry point. Takes a composition snapshot and
/// returns the raw bytes of a valid PDF file.
pub fn render(project: &ComicProject) -> Result<Vec<u8>> {
    let fetcher = default_fetcher();
    export::export_project(project, fetcher.as_ref(), &mut NoHooks)
}

/// Render a project described as JSON to PDF bytes.
pub fn export_json(json: &str) -> Result<Vec<u8>> {
    let project: ComicProject = serde_json::from_str(json)?;
    render(&project)
}
