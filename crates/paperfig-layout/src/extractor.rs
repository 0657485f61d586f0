use std::path::Path;

use paperfig_core::{Caption, ExtractedFigure, PageLayout, PdfBackend, PdfDocument, Rect};

use crate::config::FigureConfig;
use crate::{FigureError, caption, dedup, region};

/// A configurable figure extraction pipeline.
///
/// Holds a [`FigureConfig`] and exposes each pipeline step as a method.
/// The default constructor uses built-in defaults; use
/// [`FigureExtractor::with_config`] to supply custom thresholds or a custom
/// caption pattern.
pub struct FigureExtractor {
    config: FigureConfig,
}

impl Default for FigureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FigureExtractor {
    /// Create an extractor with default configuration.
    pub fn new() -> Self {
        Self {
            config: FigureConfig::default(),
        }
    }

    /// Create an extractor with a custom configuration.
    pub fn with_config(config: FigureConfig) -> Self {
        Self { config }
    }

    /// Get a reference to the current config.
    pub fn config(&self) -> &FigureConfig {
        &self.config
    }

    /// Locate and merge captions on a page, top to bottom (step 1).
    pub fn find_captions(&self, page: &PageLayout) -> Vec<Caption> {
        caption::find_captions_with_config(page, &self.config)
    }

    /// Resolve one figure region given the band's top boundary (step 2).
    pub fn resolve_region(
        &self,
        page: &PageLayout,
        caption: &Caption,
        prev_bottom: Option<f32>,
    ) -> Rect {
        region::resolve_region_with_config(page, caption, prev_bottom, &self.config)
    }

    /// Resolve the regions of a page's ordered captions (step 2, whole page).
    pub fn resolve_regions(&self, page: &PageLayout, captions: &[Caption]) -> Vec<Rect> {
        region::resolve_regions(page, captions, &self.config)
    }

    /// Open `path` with `backend` and extract every captioned figure.
    ///
    /// Returns an empty list, not an error, when the document has more than
    /// `max_pages` pages.
    pub fn extract_figures(
        &self,
        path: &Path,
        backend: &dyn PdfBackend,
    ) -> Result<Vec<ExtractedFigure>, FigureError> {
        let document = backend.open(path)?;
        let page_count = document.page_count();
        if page_count > self.config.max_pages {
            tracing::info!(
                path = %path.display(),
                page_count,
                max_pages = self.config.max_pages,
                "skipping figure extraction: document too long"
            );
            return Ok(Vec::new());
        }
        self.extract_from_document(&*document)
    }

    /// Run the pipeline on an already-opened document.
    pub fn extract_from_document(
        &self,
        document: &dyn PdfDocument,
    ) -> Result<Vec<ExtractedFigure>, FigureError> {
        let page_count = document.page_count();
        if page_count > self.config.max_pages {
            return Ok(Vec::new());
        }

        let zoom = self.config.zoom();
        let mut figures = Vec::new();

        for page_index in 0..page_count {
            let page = document.page_layout(page_index)?;
            let captions = self.find_captions(&page);
            if captions.is_empty() {
                continue;
            }

            let regions = self.resolve_regions(&page, &captions);
            for (caption, region) in captions.into_iter().zip(regions) {
                let png_bytes = document.render_region(page_index, region, zoom)?;
                figures.push(ExtractedFigure {
                    number: caption.number,
                    page: page_index,
                    caption: caption.text,
                    png_bytes,
                    bbox: region,
                });
            }
        }

        Ok(dedup::dedup_by_number(figures))
    }

    /// Extract all figures and return the first one numbered `number`.
    ///
    /// Each call is a full extraction pass. For several lookups against the
    /// same document, call [`extract_figures`](Self::extract_figures) once and
    /// use [`crate::find_figure`].
    pub fn extract_figure_by_number(
        &self,
        path: &Path,
        number: u32,
        backend: &dyn PdfBackend,
    ) -> Result<Option<ExtractedFigure>, FigureError> {
        let figures = self.extract_figures(path, backend)?;
        Ok(figures.into_iter().find(|fig| fig.number == number))
    }
}
