use std::path::Path;

use thiserror::Error;

pub mod tool;

// Re-export domain types for convenience
pub use paperfig_core::config_file::{ConfigFile, FiguresConfig, load_config};
pub use paperfig_core::{Caption, ExtractedFigure, PdfBackend, Rect};
pub use paperfig_layout::{
    FigureConfig, FigureConfigBuilder, FigureError, FigureExtractor, find_figure,
};
pub use tool::{FigureTool, ToolContent, ToolResult};

/// Default render resolution.
pub const DEFAULT_DPI: u32 = 200;
/// Default page-count guard.
pub const DEFAULT_MAX_PAGES: usize = 50;

#[derive(Error, Debug)]
pub enum PaperfigError {
    #[error("figure extraction error: {0}")]
    Extraction(#[from] FigureError),
    #[cfg(not(feature = "pdf"))]
    #[error("PDF support not compiled in (enable the `pdf` feature of paperfig)")]
    NoPdfSupport,
}

/// Extract every captioned figure from the PDF at `path`.
///
/// Documents with more than `max_pages` pages are skipped and yield an empty
/// list.
pub fn extract_figures(
    path: &Path,
    dpi: u32,
    max_pages: usize,
) -> Result<Vec<ExtractedFigure>, PaperfigError> {
    let config = FigureConfigBuilder::new()
        .dpi(dpi)
        .max_pages(max_pages)
        .build()
        .map_err(FigureError::from)?;
    extract_with_config(path, config)
}

/// Extract the figure numbered `number`, or `None` when there is none.
///
/// Runs a full extraction; to look up several figures of one document, call
/// [`extract_figures`] once and use [`find_figure`].
pub fn extract_figure_by_number(
    path: &Path,
    number: u32,
    dpi: u32,
) -> Result<Option<ExtractedFigure>, PaperfigError> {
    let figures = extract_figures(path, dpi, DEFAULT_MAX_PAGES)?;
    Ok(figures.into_iter().find(|fig| fig.number == number))
}

/// Extract with a fully specified configuration.
#[cfg(feature = "pdf")]
pub fn extract_with_config(
    path: &Path,
    config: FigureConfig,
) -> Result<Vec<ExtractedFigure>, PaperfigError> {
    let backend = paperfig_mupdf::MupdfBackend::default();
    Ok(FigureExtractor::with_config(config).extract_figures(path, &backend)?)
}

#[cfg(not(feature = "pdf"))]
pub fn extract_with_config(
    _path: &Path,
    _config: FigureConfig,
) -> Result<Vec<ExtractedFigure>, PaperfigError> {
    Err(PaperfigError::NoPdfSupport)
}

/// Build a [`FigureConfig`] from the cascaded on-disk config files.
///
/// Falls back to defaults when no file sets a value; an invalid caption
/// pattern in the file is an error.
pub fn config_from_files() -> Result<FigureConfig, PaperfigError> {
    let figures = load_config().figures.unwrap_or_default();
    Ok(FigureConfigBuilder::from_file(&figures)
        .build()
        .map_err(FigureError::from)?)
}
