use std::path::Path;

use thiserror::Error;

use crate::Rect;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to read page {page}: {message}")]
    PageError { page: usize, message: String },
    #[error("failed to render page {page}: {message}")]
    RenderError { page: usize, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Discriminates text blocks from other block types in a page layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Text,
    Image,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub bbox: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub bbox: Rect,
    pub spans: Vec<TextSpan>,
}

/// A block of the structured text dump: blocks -> lines -> spans.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub kind: BlockKind,
    pub bbox: Rect,
    pub lines: Vec<TextLine>,
}

impl TextBlock {
    /// Convenience constructor for a text block holding one single-span line.
    pub fn text(text: impl Into<String>, bbox: Rect) -> Self {
        Self {
            kind: BlockKind::Text,
            bbox,
            lines: vec![TextLine {
                bbox,
                spans: vec![TextSpan {
                    text: text.into(),
                    bbox,
                }],
            }],
        }
    }

    /// All span text joined by single spaces and trimmed.
    pub fn joined_text(&self) -> String {
        let joined = self
            .lines
            .iter()
            .flat_map(|line| line.spans.iter())
            .map(|span| span.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        joined.trim().to_string()
    }
}

/// Placement of an embedded raster image on a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub bbox: Rect,
}

/// Everything the figure pipeline needs to know about one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// 0-based page index.
    pub index: usize,
    /// Page rectangle in page coordinates.
    pub bounds: Rect,
    pub blocks: Vec<TextBlock>,
    pub images: Vec<ImagePlacement>,
}

/// Trait for PDF backends.
///
/// Implementors open documents; the figure pipeline (caption location,
/// region resolution, deduplication) lives in `paperfig_layout`.
pub trait PdfBackend: Send + Sync {
    /// Open the document at `path` for the duration of one extraction.
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, BackendError>;
}

/// An opened, paginated document.
pub trait PdfDocument {
    fn page_count(&self) -> usize;

    /// Structured text and image placements for page `index`.
    fn page_layout(&self, index: usize) -> Result<PageLayout, BackendError>;

    /// Rasterize the part of page `index` inside `clip` at `zoom` times the
    /// 72-units-per-inch page space, returning PNG bytes.
    fn render_region(&self, index: usize, clip: Rect, zoom: f32) -> Result<Vec<u8>, BackendError>;
}
