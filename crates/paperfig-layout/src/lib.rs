use std::path::Path;

use thiserror::Error;

pub mod caption;
pub mod config;
pub mod dedup;
pub mod extractor;
pub mod region;

pub use caption::{find_captions, merge_split_captions};
pub use config::{ConfigError, FigureConfig, FigureConfigBuilder};
pub use dedup::{dedup_by_number, find_figure};
pub use extractor::FigureExtractor;
pub use region::resolve_region;
// Re-export domain types from core (canonical definitions live there)
pub use paperfig_core::{BackendError, Caption, ExtractedFigure, PdfBackend, PdfDocument, Rect};

#[derive(Error, Debug)]
pub enum FigureError {
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Extract all captioned figures from a PDF using the given backend.
///
/// Pipeline:
/// 1. Open the document; skip it (empty result) if longer than 50 pages
/// 2. Per page, find "Fig./Figure/FIG. N" caption blocks, merging halves
///    split across columns
/// 3. For each caption top to bottom, resolve the figure region between the
///    previous caption and this one
/// 4. Render each region to PNG at 200 DPI
/// 5. Keep the largest rendering of each figure number
pub fn extract_figures(
    pdf_path: &Path,
    backend: &dyn PdfBackend,
) -> Result<Vec<ExtractedFigure>, FigureError> {
    FigureExtractor::new().extract_figures(pdf_path, backend)
}

/// Extract a single figure by number, or `None` if the document has no
/// figure with that number.
pub fn extract_figure_by_number(
    pdf_path: &Path,
    number: u32,
    backend: &dyn PdfBackend,
) -> Result<Option<ExtractedFigure>, FigureError> {
    FigureExtractor::new().extract_figure_by_number(pdf_path, number, backend)
}
