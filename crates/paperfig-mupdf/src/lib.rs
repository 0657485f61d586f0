use std::cell::RefCell;
use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbImage};
use mupdf::{Colorspace, Document, Matrix, TextBlockType, TextPageFlags};

use paperfig_core::{
    BackendError, BlockKind, ImagePlacement, PageLayout, PdfBackend, PdfDocument, Rect, TextBlock,
    TextLine, TextSpan,
};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency
/// (which is AGPL-3.0) so that the layout code does not transitively
/// depend on it.
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for MupdfBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;
        let page_count = document
            .page_count()
            .map_err(|e| BackendError::OpenError(e.to_string()))?;

        Ok(Box::new(MupdfDocument {
            document,
            page_count: page_count.max(0) as usize,
            rendered: RefCell::new(None),
        }))
    }
}

/// Last full-page rasterization, reused while consecutive regions come from
/// the same page at the same zoom.
struct RenderedPage {
    index: usize,
    zoom: f32,
    bounds: Rect,
    image: RgbImage,
}

/// An open MuPDF document.
pub struct MupdfDocument {
    document: Document,
    page_count: usize,
    rendered: RefCell<Option<RenderedPage>>,
}

impl MupdfDocument {
    fn render_page(&self, index: usize, zoom: f32) -> Result<RenderedPage, BackendError> {
        let render_err = |e: mupdf::Error| BackendError::RenderError {
            page: index,
            message: e.to_string(),
        };

        let page = self.document.load_page(index as i32).map_err(render_err)?;
        let bounds = to_rect(page.bounds().map_err(render_err)?);

        let matrix = Matrix::new_scale(zoom, zoom);
        let colorspace = Colorspace::device_rgb();
        let pixmap = page
            .to_pixmap(&matrix, &colorspace, false, true)
            .map_err(render_err)?;

        let width = pixmap.width() as u32;
        let height = pixmap.height() as u32;
        let samples = pixmap.samples();
        let n = pixmap.n() as usize;

        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height as usize {
            for x in 0..width as usize {
                let offset = (y * width as usize + x) * n;
                let r = samples.get(offset).copied().unwrap_or(255);
                let g = samples.get(offset + 1).copied().unwrap_or(r);
                let b = samples.get(offset + 2).copied().unwrap_or(r);
                rgb.extend_from_slice(&[r, g, b]);
            }
        }

        let image = RgbImage::from_raw(width, height, rgb).ok_or_else(|| BackendError::RenderError {
            page: index,
            message: "pixmap size does not match its samples".into(),
        })?;

        tracing::trace!(page = index, width, height, "rasterized page");

        Ok(RenderedPage {
            index,
            zoom,
            bounds,
            image,
        })
    }
}

impl PdfDocument for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_layout(&self, index: usize) -> Result<PageLayout, BackendError> {
        let page_err = |e: mupdf::Error| BackendError::PageError {
            page: index,
            message: e.to_string(),
        };

        let page = self.document.load_page(index as i32).map_err(page_err)?;
        let bounds = to_rect(page.bounds().map_err(page_err)?);
        let text_page = page
            .to_text_page(TextPageFlags::PRESERVE_IMAGES)
            .map_err(page_err)?;

        let mut blocks = Vec::new();
        let mut images = Vec::new();

        for block in text_page.blocks() {
            let bbox = to_rect(block.bounds());
            match block.r#type() {
                TextBlockType::Image => images.push(ImagePlacement { bbox }),
                TextBlockType::Text => {
                    // MuPDF does not group characters into font spans here,
                    // so each line becomes a single span.
                    let lines = block
                        .lines()
                        .map(|line| {
                            let line_bbox = to_rect(line.bounds());
                            let text: String = line
                                .chars()
                                .map(|c| c.char().unwrap_or('\u{FFFD}'))
                                .collect();
                            TextLine {
                                bbox: line_bbox,
                                spans: vec![TextSpan {
                                    text,
                                    bbox: line_bbox,
                                }],
                            }
                        })
                        .collect();
                    blocks.push(TextBlock {
                        kind: BlockKind::Text,
                        bbox,
                        lines,
                    });
                }
                #[allow(unreachable_patterns)]
                _ => {}
            }
        }

        Ok(PageLayout {
            index,
            bounds,
            blocks,
            images,
        })
    }

    fn render_region(&self, index: usize, clip: Rect, zoom: f32) -> Result<Vec<u8>, BackendError> {
        let mut cache = self.rendered.borrow_mut();
        let stale = cache
            .as_ref()
            .is_none_or(|r| r.index != index || r.zoom != zoom);
        if stale {
            *cache = Some(self.render_page(index, zoom)?);
        }
        let Some(rendered) = cache.as_ref() else {
            return Err(BackendError::RenderError {
                page: index,
                message: "page raster missing".into(),
            });
        };

        let (x, y, w, h) = pixel_window(
            clip,
            rendered.bounds,
            zoom,
            rendered.image.width(),
            rendered.image.height(),
        );
        let cropped = image::imageops::crop_imm(&rendered.image, x, y, w, h).to_image();

        let mut output = Vec::new();
        DynamicImage::ImageRgb8(cropped)
            .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
            .map_err(|e| BackendError::RenderError {
                page: index,
                message: e.to_string(),
            })?;

        Ok(output)
    }
}

fn to_rect(r: mupdf::Rect) -> Rect {
    Rect::new(r.x0, r.y0, r.x1, r.y1)
}

/// Pixel window `(x, y, width, height)` of `clip` within a page raster.
///
/// Edges are rounded outward and clamped to the raster; the window is at
/// least one pixel in each direction so an empty clip still encodes.
fn pixel_window(
    clip: Rect,
    page_bounds: Rect,
    zoom: f32,
    raster_width: u32,
    raster_height: u32,
) -> (u32, u32, u32, u32) {
    let to_px = |v: f32, origin: f32, max: u32| ((v - origin) * zoom).clamp(0.0, max as f32);

    let x0 = to_px(clip.x0, page_bounds.x0, raster_width).floor() as u32;
    let y0 = to_px(clip.y0, page_bounds.y0, raster_height).floor() as u32;
    let x1 = to_px(clip.x1, page_bounds.x0, raster_width).ceil() as u32;
    let y1 = to_px(clip.y1, page_bounds.y0, raster_height).ceil() as u32;

    let x = x0.min(raster_width.saturating_sub(1));
    let y = y0.min(raster_height.saturating_sub(1));
    let w = x1.saturating_sub(x).max(1);
    let h = y1.saturating_sub(y).max(1);
    (x, y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTER: Rect = Rect::new(0.0, 0.0, 612.0, 792.0);

    #[test]
    fn window_at_unit_zoom() {
        let window = pixel_window(Rect::new(42.0, 292.0, 558.0, 623.0), LETTER, 1.0, 612, 792);
        assert_eq!(window, (42, 292, 516, 331));
    }

    #[test]
    fn window_rounds_outward() {
        let window = pixel_window(Rect::new(10.2, 20.7, 30.1, 40.5), LETTER, 2.0, 1224, 1584);
        // 20.4 -> 20, 41.4 -> 41, 60.2 -> 61, 81.0 -> 81
        assert_eq!(window, (20, 41, 41, 40));
    }

    #[test]
    fn window_clamped_to_raster() {
        let window = pixel_window(Rect::new(-20.0, -5.0, 700.0, 900.0), LETTER, 1.0, 612, 792);
        assert_eq!(window, (0, 0, 612, 792));
    }

    #[test]
    fn window_offset_page_origin() {
        let page = Rect::new(100.0, 50.0, 712.0, 842.0);
        let window = pixel_window(Rect::new(110.0, 60.0, 210.0, 160.0), page, 1.0, 612, 792);
        assert_eq!(window, (10, 10, 100, 100));
    }

    #[test]
    fn empty_clip_is_one_pixel() {
        let window = pixel_window(Rect::new(50.0, 50.0, 40.0, 40.0), LETTER, 1.0, 612, 792);
        assert_eq!(window, (50, 50, 1, 1));
    }

    #[test]
    fn open_missing_file_is_open_error() {
        let result = MupdfBackend::new().open(Path::new("/nonexistent/paper.pdf"));
        assert!(matches!(result, Err(BackendError::OpenError(_))));
    }
}
