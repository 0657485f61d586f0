//! In-memory backend for testing and for callers holding pre-extracted layouts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{BackendError, PageLayout, PdfBackend, PdfDocument, Rect};

/// PNG file signature; prefixed to every placeholder rendering.
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A document assembled from [`PageLayout`]s.
///
/// Rendering does not rasterize anything: it returns a deterministic
/// placeholder payload (PNG signature followed by filler) whose length grows
/// with the pixel area of the requested region, which is all the
/// deduplication step looks at.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    pages: Vec<PageLayout>,
    unreadable_page: Option<usize>,
}

impl MemoryDocument {
    pub fn new(pages: Vec<PageLayout>) -> Self {
        Self {
            pages,
            unreadable_page: None,
        }
    }

    /// A document of `count` blank pages of the given size.
    pub fn blank(count: usize, width: f32, height: f32) -> Self {
        let pages = (0..count)
            .map(|index| PageLayout {
                index,
                bounds: Rect::new(0.0, 0.0, width, height),
                blocks: Vec::new(),
                images: Vec::new(),
            })
            .collect();
        Self::new(pages)
    }

    /// Make `page_layout(index)` fail, simulating a corrupt page.
    pub fn with_unreadable_page(mut self, index: usize) -> Self {
        self.unreadable_page = Some(index);
        self
    }
}

impl PdfDocument for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_layout(&self, index: usize) -> Result<PageLayout, BackendError> {
        if self.unreadable_page == Some(index) {
            return Err(BackendError::PageError {
                page: index,
                message: "unreadable page".into(),
            });
        }
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| BackendError::PageError {
                page: index,
                message: format!("document has {} pages", self.pages.len()),
            })
    }

    fn render_region(&self, index: usize, clip: Rect, zoom: f32) -> Result<Vec<u8>, BackendError> {
        if index >= self.pages.len() {
            return Err(BackendError::RenderError {
                page: index,
                message: format!("document has {} pages", self.pages.len()),
            });
        }

        let width = (clip.width().max(0.0) * zoom).ceil() as usize;
        let height = (clip.height().max(0.0) * zoom).ceil() as usize;
        let filler_len = (width * height / 64).max(1);

        let mut bytes = Vec::with_capacity(PNG_SIGNATURE.len() + filler_len);
        bytes.extend_from_slice(&PNG_SIGNATURE);
        bytes.extend((0..filler_len).map(|i| ((i * 31 + index) % 251) as u8));
        Ok(bytes)
    }
}

/// A [`PdfBackend`] serving [`MemoryDocument`]s registered by path.
///
/// Counts calls to [`PdfBackend::open`] via [`MemoryBackend::open_count`].
#[derive(Debug, Default)]
pub struct MemoryBackend {
    documents: HashMap<PathBuf, MemoryDocument>,
    open_count: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `document` under `path`.
    pub fn with_document(mut self, path: impl Into<PathBuf>, document: MemoryDocument) -> Self {
        self.documents.insert(path.into(), document);
        self
    }

    /// Number of times `open` has been called.
    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }
}

impl PdfBackend for MemoryBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, BackendError> {
        self.open_count.fetch_add(1, Ordering::SeqCst);
        let document = self
            .documents
            .get(path)
            .cloned()
            .ok_or_else(|| BackendError::OpenError(format!("no such document: {}", path.display())))?;
        Ok(Box::new(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_is_deterministic_and_scales_with_area() {
        let doc = MemoryDocument::blank(1, 612.0, 792.0);
        let small = Rect::new(0.0, 0.0, 100.0, 100.0);
        let large = Rect::new(0.0, 0.0, 400.0, 300.0);

        let a = doc.render_region(0, small, 2.0).unwrap();
        let b = doc.render_region(0, small, 2.0).unwrap();
        let c = doc.render_region(0, large, 2.0).unwrap();

        assert_eq!(a, b);
        assert!(c.len() > a.len());
        assert_eq!(&a[..8], &PNG_SIGNATURE);
    }

    #[test]
    fn unreadable_page_errors() {
        let doc = MemoryDocument::blank(2, 612.0, 792.0).with_unreadable_page(1);
        assert!(doc.page_layout(0).is_ok());
        assert!(matches!(
            doc.page_layout(1),
            Err(BackendError::PageError { page: 1, .. })
        ));
    }

    #[test]
    fn backend_open_unknown_path() {
        let backend = MemoryBackend::new();
        let err = backend.open(Path::new("missing.pdf")).err().unwrap();
        assert!(matches!(err, BackendError::OpenError(_)));
        assert_eq!(backend.open_count(), 1);
    }
}
