use std::collections::HashMap;

use paperfig_core::ExtractedFigure;

/// Collapse figures sharing a number, keeping the largest PNG.
///
/// An inline "Fig. 3 shows..." that happens to open a text block renders a
/// small, mostly-text region; the real figure renders larger. The survivor
/// takes the slot of the first occurrence of its number, and ties keep the
/// earlier figure.
pub fn dedup_by_number(figures: Vec<ExtractedFigure>) -> Vec<ExtractedFigure> {
    let mut seen: HashMap<u32, usize> = HashMap::new();
    let mut deduped: Vec<ExtractedFigure> = Vec::with_capacity(figures.len());

    for fig in figures {
        match seen.get(&fig.number) {
            Some(&slot) => {
                let existing = &deduped[slot];
                if fig.png_bytes.len() > existing.png_bytes.len() {
                    tracing::debug!(
                        number = fig.number,
                        kept_page = fig.page,
                        dropped_page = existing.page,
                        "replacing smaller duplicate figure"
                    );
                    deduped[slot] = fig;
                }
            }
            None => {
                seen.insert(fig.number, deduped.len());
                deduped.push(fig);
            }
        }
    }

    deduped
}

/// First figure with the given number.
///
/// Lets callers run one extraction pass and answer many lookups from it.
pub fn find_figure(figures: &[ExtractedFigure], number: u32) -> Option<&ExtractedFigure> {
    figures.iter().find(|fig| fig.number == number)
}
