use once_cell::sync::Lazy;
use regex::Regex;

use paperfig_core::{BlockKind, Caption, PageLayout};

use crate::config::FigureConfig;

/// Matches "Fig. 1", "Figure 2", "FIG. 3", "Fig 4", "Fig. S1".
///
/// The `S` of supplementary figures is not captured, so "Fig. S1" numbers
/// as 1.
static CAPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:Fig\.?|Figure|FIG\.?)\s*S?(\d+)").unwrap());

/// Find figure captions on a page, sorted top to bottom.
pub fn find_captions(page: &PageLayout) -> Vec<Caption> {
    find_captions_with_config(page, &FigureConfig::default())
}

/// Config-aware version of [`find_captions`].
pub(crate) fn find_captions_with_config(page: &PageLayout, config: &FigureConfig) -> Vec<Caption> {
    let caption_re = config.caption_re.as_ref().unwrap_or(&CAPTION_RE);

    let captions: Vec<Caption> = page
        .blocks
        .iter()
        .filter(|block| block.kind == BlockKind::Text)
        .filter_map(|block| {
            let text = block.joined_text();
            if text.is_empty() {
                return None;
            }
            let number = caption_re
                .captures(&text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok())?;
            Some(Caption {
                number,
                text,
                bbox: block.bbox,
            })
        })
        .collect();

    let mut merged = merge_split_captions(captions, config.merge_tolerance);
    merged.sort_by(|a, b| a.bbox.y0.total_cmp(&b.bbox.y0));

    tracing::debug!(
        page = page.index,
        captions = merged.len(),
        "caption scan complete"
    );
    merged
}

/// Merge caption blocks split across a two-column layout.
///
/// A caption set at the same height in both columns comes out of text
/// extraction as two blocks with the same figure number. Each caption pairs
/// with at most one later partner (first match wins).
pub fn merge_split_captions(captions: Vec<Caption>, tolerance: f32) -> Vec<Caption> {
    if captions.len() <= 1 {
        return captions;
    }

    let mut used = vec![false; captions.len()];
    let mut merged = Vec::with_capacity(captions.len());

    for i in 0..captions.len() {
        if used[i] {
            continue;
        }
        used[i] = true;

        let cap = &captions[i];
        let partner = (i + 1..captions.len()).find(|&j| {
            !used[j]
                && captions[j].number == cap.number
                && (captions[j].bbox.y0 - cap.bbox.y0).abs() < tolerance
        });

        match partner {
            Some(j) => {
                used[j] = true;
                let other = &captions[j];
                tracing::trace!(number = cap.number, "merging split caption");
                merged.push(Caption {
                    number: cap.number,
                    text: format!("{} {}", cap.text, other.text),
                    bbox: cap.bbox | other.bbox,
                });
            }
            None => merged.push(cap.clone()),
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperfig_core::{ImagePlacement, Rect, TextBlock};

    fn page(blocks: Vec<TextBlock>) -> PageLayout {
        PageLayout {
            index: 0,
            bounds: Rect::new(0.0, 0.0, 612.0, 792.0),
            blocks,
            images: Vec::new(),
        }
    }

    fn caption(number: u32, text: &str, bbox: Rect) -> Caption {
        Caption {
            number,
            text: text.to_string(),
            bbox,
        }
    }

    #[test]
    fn test_caption_variants() {
        let cases = [
            ("Fig. 1. A plot.", 1),
            ("Figure 2: Architecture", 2),
            ("FIG. 3 Results", 3),
            ("Fig 4 overview", 4),
            ("fig.12 lower case", 12),
            ("Fig. S1 supplementary", 1),
            ("Figure10. no space", 10),
        ];
        for (text, expected) in cases {
            let p = page(vec![TextBlock::text(text, Rect::new(50.0, 100.0, 300.0, 115.0))]);
            let found = find_captions(&p);
            assert_eq!(found.len(), 1, "no caption for {text:?}");
            assert_eq!(found[0].number, expected, "wrong number for {text:?}");
            assert_eq!(found[0].text, text);
        }
    }

    #[test]
    fn test_non_captions_ignored() {
        let p = page(vec![
            TextBlock::text("See Figure 3 for details.", Rect::new(50.0, 100.0, 300.0, 115.0)),
            TextBlock::text("Table 1: Results", Rect::new(50.0, 200.0, 300.0, 215.0)),
            TextBlock::text("Figures are shown below", Rect::new(50.0, 300.0, 300.0, 315.0)),
            TextBlock::text("   ", Rect::new(50.0, 400.0, 300.0, 415.0)),
        ]);
        assert!(find_captions(&p).is_empty());
    }

    #[test]
    fn test_inline_reference_starting_block_is_caption() {
        let p = page(vec![TextBlock::text(
            "Fig. 2 shows the trend.",
            Rect::new(50.0, 100.0, 300.0, 115.0),
        )]);
        let found = find_captions(&p);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].number, 2);
    }

    #[test]
    fn test_image_blocks_skipped() {
        let mut block = TextBlock::text("Figure 1", Rect::new(50.0, 100.0, 300.0, 115.0));
        block.kind = BlockKind::Image;
        let mut p = page(vec![block]);
        p.images.push(ImagePlacement {
            bbox: Rect::new(50.0, 100.0, 300.0, 115.0),
        });
        assert!(find_captions(&p).is_empty());
    }

    #[test]
    fn test_overflowing_number_is_not_a_caption() {
        let p = page(vec![TextBlock::text(
            "Figure 99999999999999999999",
            Rect::new(50.0, 100.0, 300.0, 115.0),
        )]);
        assert!(find_captions(&p).is_empty());
    }

    #[test]
    fn test_sorted_by_top_edge() {
        let p = page(vec![
            TextBlock::text("Figure 2. Lower", Rect::new(50.0, 500.0, 300.0, 515.0)),
            TextBlock::text("Figure 1. Upper", Rect::new(50.0, 200.0, 300.0, 215.0)),
        ]);
        let found = find_captions(&p);
        assert_eq!(found.iter().map(|c| c.number).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_split_caption_merged() {
        let p = page(vec![
            TextBlock::text("Figure 4. Left half of the", Rect::new(50.0, 400.0, 290.0, 420.0)),
            TextBlock::text("caption continues here.", Rect::new(320.0, 402.0, 560.0, 422.0)),
            TextBlock::text("Figure 4 right column", Rect::new(320.0, 403.0, 560.0, 418.0)),
        ]);
        let found = find_captions(&p);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "Figure 4. Left half of the Figure 4 right column");
        assert_eq!(found[0].bbox, Rect::new(50.0, 400.0, 560.0, 420.0));
    }

    #[test]
    fn test_merge_tolerance_boundary() {
        let a = caption(1, "Figure 1 left", Rect::new(50.0, 100.0, 290.0, 115.0));
        let near = caption(1, "Figure 1 right", Rect::new(320.0, 104.9, 560.0, 118.0));
        let far = caption(1, "Figure 1 right", Rect::new(320.0, 105.0, 560.0, 118.0));

        assert_eq!(merge_split_captions(vec![a.clone(), near], 5.0).len(), 1);
        assert_eq!(merge_split_captions(vec![a, far], 5.0).len(), 2);
    }

    #[test]
    fn test_merge_requires_same_number() {
        let a = caption(1, "Figure 1", Rect::new(50.0, 100.0, 290.0, 115.0));
        let b = caption(2, "Figure 2", Rect::new(320.0, 100.0, 560.0, 115.0));
        let merged = merge_split_captions(vec![a, b], 5.0);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_is_pairwise_not_transitive() {
        let a = caption(3, "Figure 3 a", Rect::new(50.0, 100.0, 200.0, 115.0));
        let b = caption(3, "Figure 3 b", Rect::new(210.0, 101.0, 400.0, 115.0));
        let c = caption(3, "Figure 3 c", Rect::new(410.0, 102.0, 560.0, 115.0));
        let merged = merge_split_captions(vec![a, b, c], 5.0);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text, "Figure 3 a Figure 3 b");
        assert_eq!(merged[1].text, "Figure 3 c");
    }

    #[test]
    fn test_custom_caption_pattern() {
        let config = crate::FigureConfigBuilder::new()
            .caption_regex(r"^Abbildung\s*(\d+)")
            .build()
            .unwrap();
        let p = page(vec![
            TextBlock::text("Abbildung 7: Aufbau", Rect::new(50.0, 100.0, 300.0, 115.0)),
            TextBlock::text("Figure 1. Ignored", Rect::new(50.0, 300.0, 300.0, 315.0)),
        ]);
        let found = find_captions_with_config(&p, &config);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].number, 7);
    }
}
