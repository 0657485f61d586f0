use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub figures: Option<FiguresConfig>,
}

/// `[figures]` table: overrides for figure extraction thresholds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FiguresConfig {
    pub dpi: Option<u32>,
    pub max_pages: Option<usize>,
    pub min_image_size: Option<f32>,
    pub merge_tolerance: Option<f32>,
    pub band_tolerance: Option<f32>,
    pub header_skip: Option<f32>,
    pub fallback_margin: Option<f32>,
    pub padding: Option<f32>,
    pub caption_gap: Option<f32>,
    pub caption_pattern: Option<String>,
}

/// Platform config directory path: `<config_dir>/paperfig/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("paperfig").join("config.toml"))
}

/// Load config by cascading CWD `.paperfig.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".paperfig.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let base = base.figures.unwrap_or_default();
    let overlay = overlay.figures.unwrap_or_default();

    ConfigFile {
        figures: Some(FiguresConfig {
            dpi: overlay.dpi.or(base.dpi),
            max_pages: overlay.max_pages.or(base.max_pages),
            min_image_size: overlay.min_image_size.or(base.min_image_size),
            merge_tolerance: overlay.merge_tolerance.or(base.merge_tolerance),
            band_tolerance: overlay.band_tolerance.or(base.band_tolerance),
            header_skip: overlay.header_skip.or(base.header_skip),
            fallback_margin: overlay.fallback_margin.or(base.fallback_margin),
            padding: overlay.padding.or(base.padding),
            caption_gap: overlay.caption_gap.or(base.caption_gap),
            caption_pattern: overlay.caption_pattern.or(base.caption_pattern),
        }),
    }
}

/// Save the config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, String> {
    let path = config_path().ok_or_else(|| "Could not determine config directory".to_string())?;
    save_to_path(config, &path)?;
    Ok(path)
}

/// Save the config to `path`, creating parent directories as needed.
pub fn save_to_path(config: &ConfigFile, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let content =
        toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(path, content).map_err(|e| format!("Failed to write config: {}", e))
}
