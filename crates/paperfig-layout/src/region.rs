use paperfig_core::{Caption, PageLayout, Rect};

use crate::config::FigureConfig;

/// Determine the page region holding the figure for `caption`.
///
/// The search band runs from `prev_bottom` (the previous caption's bottom
/// edge plus gap, or just below the running header for the first caption)
/// down to this caption. Every sufficiently large image overlapping the band
/// is unioned with the caption, with no horizontal filter, so multi-panel
/// figures spread across both columns stay in one piece. Without any such
/// image the figure is taken to be vector art and the whole band is used,
/// inset from the page edges.
pub fn resolve_region(page: &PageLayout, caption: &Caption, prev_bottom: Option<f32>) -> Rect {
    resolve_region_with_config(page, caption, prev_bottom, &FigureConfig::default())
}

/// Config-aware version of [`resolve_region`].
pub(crate) fn resolve_region_with_config(
    page: &PageLayout,
    caption: &Caption,
    prev_bottom: Option<f32>,
    config: &FigureConfig,
) -> Rect {
    let page_rect = page.bounds;
    let top = prev_bottom.unwrap_or(page_rect.y0 + config.header_skip);
    let bottom = caption.bbox.y1;

    let band_top = top - config.band_tolerance;
    let band_bottom = caption.bbox.y0 + config.band_tolerance;

    let associated = page
        .images
        .iter()
        .map(|img| img.bbox)
        .filter(|r| r.width() >= config.min_image_size && r.height() >= config.min_image_size)
        .filter(|r| r.y1 >= band_top && r.y0 <= band_bottom)
        .reduce(|acc, r| acc | r);

    let figure_rect = match associated {
        Some(images) => {
            let rect = images | caption.bbox;
            Rect {
                y0: rect.y0.max(top),
                ..rect
            }
        }
        None => {
            tracing::debug!(
                page = page.index,
                number = caption.number,
                "no raster images in band, using full-width region"
            );
            Rect::new(
                page_rect.x0 + config.fallback_margin,
                top,
                page_rect.x1 - config.fallback_margin,
                bottom,
            )
        }
    };

    figure_rect.pad(config.padding) & page_rect
}

/// Resolve regions for a page's captions in order.
///
/// Each caption's band starts `caption_gap` below the bottom of the caption
/// before it.
pub(crate) fn resolve_regions(
    page: &PageLayout,
    captions: &[Caption],
    config: &FigureConfig,
) -> Vec<Rect> {
    captions
        .iter()
        .scan(None, |prev_bottom: &mut Option<f32>, caption| {
            let region = resolve_region_with_config(page, caption, *prev_bottom, config);
            *prev_bottom = Some(caption.bbox.y1 + config.caption_gap);
            Some(region)
        })
        .collect()
}
