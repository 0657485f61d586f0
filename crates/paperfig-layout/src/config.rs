use regex::Regex;

use paperfig_core::config_file::FiguresConfig;

/// Configuration for the figure extraction pipeline.
///
/// Distances are in page units (1/72 inch). `caption_re: None` means
/// "use the built-in Fig./Figure/FIG. pattern". Use [`FigureConfigBuilder`]
/// to construct with string patterns.
#[derive(Debug, Clone)]
pub struct FigureConfig {
    // ── rendering ──
    /// Render resolution (default: 200).
    pub(crate) dpi: u32,
    /// Documents with more pages than this are skipped (default: 50).
    pub(crate) max_pages: usize,

    // ── caption.rs ──
    /// Regex matched against each block's text; group 1 is the figure number.
    pub(crate) caption_re: Option<Regex>,
    /// Max top-edge distance for two same-numbered captions to merge (default: 5).
    pub(crate) merge_tolerance: f32,

    // ── region.rs ──
    /// Images narrower or shorter than this are ignored (default: 40).
    pub(crate) min_image_size: f32,
    /// Slack on both ends of the vertical band when testing image overlap (default: 5).
    pub(crate) band_tolerance: f32,
    /// Running-header height skipped above the first caption's band (default: 20).
    pub(crate) header_skip: f32,
    /// Horizontal inset of the full-width fallback region (default: 30).
    pub(crate) fallback_margin: f32,
    /// Padding added around every resolved region (default: 8).
    pub(crate) padding: f32,
    /// Gap below a caption where the next caption's band starts (default: 5).
    pub(crate) caption_gap: f32,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            max_pages: 50,
            caption_re: None,
            merge_tolerance: 5.0,
            min_image_size: 40.0,
            band_tolerance: 5.0,
            header_skip: 20.0,
            fallback_margin: 30.0,
            padding: 8.0,
            caption_gap: 5.0,
        }
    }
}

impl FigureConfig {
    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Rendering zoom relative to the 72-units-per-inch page space.
    pub fn zoom(&self) -> f32 {
        self.dpi as f32 / 72.0
    }
}

/// Builder for [`FigureConfig`].
///
/// Accepts a string caption pattern that is compiled in [`build()`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct FigureConfigBuilder {
    dpi: Option<u32>,
    max_pages: Option<usize>,
    caption_re: Option<String>,
    merge_tolerance: Option<f32>,
    min_image_size: Option<f32>,
    band_tolerance: Option<f32>,
    header_skip: Option<f32>,
    fallback_margin: Option<f32>,
    padding: Option<f32>,
    caption_gap: Option<f32>,
}

/// Error from [`FigureConfigBuilder::build`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid caption pattern: {0}")]
    Regex(#[from] regex::Error),
    #[error("caption pattern must have a capture group for the figure number")]
    MissingNumberGroup,
    #[error("dpi must be greater than zero")]
    ZeroDpi,
}

impl FigureConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from the `[figures]` table of a config file.
    pub fn from_file(figures: &FiguresConfig) -> Self {
        Self {
            dpi: figures.dpi,
            max_pages: figures.max_pages,
            caption_re: figures.caption_pattern.clone(),
            merge_tolerance: figures.merge_tolerance,
            min_image_size: figures.min_image_size,
            band_tolerance: figures.band_tolerance,
            header_skip: figures.header_skip,
            fallback_margin: figures.fallback_margin,
            padding: figures.padding,
            caption_gap: figures.caption_gap,
        }
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.dpi = Some(dpi);
        self
    }

    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Replace the caption pattern. The first capture group must be the number.
    pub fn caption_regex(mut self, pattern: &str) -> Self {
        self.caption_re = Some(pattern.to_string());
        self
    }

    pub fn merge_tolerance(mut self, units: f32) -> Self {
        self.merge_tolerance = Some(units);
        self
    }

    pub fn min_image_size(mut self, units: f32) -> Self {
        self.min_image_size = Some(units);
        self
    }

    pub fn band_tolerance(mut self, units: f32) -> Self {
        self.band_tolerance = Some(units);
        self
    }

    pub fn header_skip(mut self, units: f32) -> Self {
        self.header_skip = Some(units);
        self
    }

    pub fn fallback_margin(mut self, units: f32) -> Self {
        self.fallback_margin = Some(units);
        self
    }

    pub fn padding(mut self, units: f32) -> Self {
        self.padding = Some(units);
        self
    }

    pub fn caption_gap(mut self, units: f32) -> Self {
        self.caption_gap = Some(units);
        self
    }

    /// Compile patterns and validate values.
    pub fn build(self) -> Result<FigureConfig, ConfigError> {
        let defaults = FigureConfig::default();

        let caption_re = match self.caption_re {
            Some(pattern) => {
                let re = Regex::new(&pattern)?;
                if re.captures_len() < 2 {
                    return Err(ConfigError::MissingNumberGroup);
                }
                Some(re)
            }
            None => None,
        };

        let dpi = self.dpi.unwrap_or(defaults.dpi);
        if dpi == 0 {
            return Err(ConfigError::ZeroDpi);
        }

        Ok(FigureConfig {
            dpi,
            max_pages: self.max_pages.unwrap_or(defaults.max_pages),
            caption_re,
            merge_tolerance: self.merge_tolerance.unwrap_or(defaults.merge_tolerance),
            min_image_size: self.min_image_size.unwrap_or(defaults.min_image_size),
            band_tolerance: self.band_tolerance.unwrap_or(defaults.band_tolerance),
            header_skip: self.header_skip.unwrap_or(defaults.header_skip),
            fallback_margin: self.fallback_margin.unwrap_or(defaults.fallback_margin),
            padding: self.padding.unwrap_or(defaults.padding),
            caption_gap: self.caption_gap.unwrap_or(defaults.caption_gap),
        })
    }
}
