pub mod backend;
pub mod config_file;
pub mod geometry;
pub mod memory;

// Re-export for convenience
pub use backend::{
    BackendError, BlockKind, ImagePlacement, PageLayout, PdfBackend, PdfDocument, TextBlock,
    TextLine, TextSpan,
};
pub use geometry::Rect;

/// A figure caption located on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    /// Figure number parsed from the caption label ("Fig. 3" -> 3).
    pub number: u32,
    /// Full caption text, whitespace-joined across lines and spans.
    pub text: String,
    /// Caption block bounds in page coordinates.
    pub bbox: Rect,
}

/// A figure rendered out of a document, paired with its caption.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFigure {
    pub number: u32,
    /// 0-based page index.
    pub page: usize,
    pub caption: String,
    /// PNG encoding of the figure region.
    pub png_bytes: Vec<u8>,
    /// Rendered region in page coordinates.
    pub bbox: Rect,
}

impl ExtractedFigure {
    /// Region as an `(x0, y0, x1, y1)` tuple.
    pub fn bbox_tuple(&self) -> (f32, f32, f32, f32) {
        (self.bbox.x0, self.bbox.y0, self.bbox.x1, self.bbox.y1)
    }
}
