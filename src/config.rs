//! Gallery configuration module.
//!
//! Handles loading, validating, and merging `wallgrid.toml`. Stock defaults
//! are overridden by whatever keys the user file sets.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [thumbnail]
//! width = 240               # Thumbnail box in pixels
//! height = 135
//! quality = 90              # JPEG quality (0-100)
//! mode = "fill"             # "fill" = crop to exact size, "fit" = shrink inside box
//!
//! [grid]
//! spacing = 30              # Gap between cells
//! columns = 4               # Initial columns before the first resize
//! rows = 4                  # Initial rows, sizes the preferred window
//!
//! [grid.margins]
//! left = 50
//! top = 30
//! right = 50
//! bottom = 30
//!
//! [cache]
//! # root = "..."            # Default: <platform cache dir>/wallgrid/thumbnails
//!
//! [scan]
//! root = "wallpapers"       # Directory holding the source images
//! recursive = false
//! order = "name"            # "name" or "newest"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Pixel lengths are capped at [`MAX_PIXELS`] and the column/row hints at
//! [`MAX_GRID_HINT`], so no accepted config can push the grid size past
//! `u32`.
//!
//! Unknown keys are rejected to catch typos early. Every geometric value is
//! checked before any file is touched: a non-positive thumbnail size or a
//! negative spacing/margin is a [`ConfigError::Validation`].

use crate::imaging::{Quality, ResizeMode, ThumbnailParams};
use crate::layout::{GridSpec, Margins};
use crate::types::Size;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Gallery configuration loaded from `wallgrid.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Thumbnail rendering settings.
    pub thumbnail: ThumbnailConfig,
    /// Grid geometry and initial hints.
    pub grid: GridConfig,
    /// Cache location.
    pub cache: CacheConfig,
    /// Source collection settings.
    pub scan: ScanConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

/// Thumbnail rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailConfig {
    pub width: i64,
    pub height: i64,
    /// JPEG encoding quality (0 = worst, 100 = best).
    pub quality: u32,
    pub mode: ResizeMode,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: 240,
            height: 135,
            quality: 90,
            mode: ResizeMode::Fill,
        }
    }
}

/// Grid geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    pub spacing: i64,
    /// Column count used until the first viewport size is known.
    pub columns: i64,
    /// Row count used to derive the preferred initial window height.
    pub rows: i64,
    pub margins: MarginsConfig,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            spacing: 30,
            columns: 4,
            rows: 4,
            margins: MarginsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarginsConfig {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl Default for MarginsConfig {
    fn default() -> Self {
        Self {
            left: 50,
            top: 30,
            right: 50,
            bottom: 30,
        }
    }
}

/// Cache location. `None` resolves to the platform cache directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

/// Order in which scanned sources enter the gallery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// By file name, ascending.
    #[default]
    Name,
    /// By modification time, most recent first.
    Newest,
}

/// Source collection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub root: PathBuf,
    pub recursive: bool,
    pub order: SortOrder,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("wallpapers"),
            recursive: false,
            order: SortOrder::Name,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel thumbnail workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Upper bound for any pixel length: thumbnail edges, spacing, margins.
pub const MAX_PIXELS: i64 = 16_384;

/// Upper bound for the initial column and row hints.
pub const MAX_GRID_HINT: i64 = 1_000;

fn in_range(key: &str, value: i64, min: i64, max: i64) -> Result<u32, ConfigError> {
    if !(min..=max).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{key} must be between {min} and {max}, got {value}"
        )));
    }
    u32::try_from(value)
        .map_err(|_| ConfigError::Validation(format!("{key} is out of range: {value}")))
}

fn non_negative(key: &str, value: i64) -> Result<u32, ConfigError> {
    in_range(key, value, 0, MAX_PIXELS)
}

fn positive(key: &str, value: i64) -> Result<u32, ConfigError> {
    in_range(key, value, 1, MAX_PIXELS)
}

fn grid_hint(key: &str, value: i64) -> Result<u32, ConfigError> {
    in_range(key, value, 1, MAX_GRID_HINT)
}

impl GalleryConfig {
    pub fn thumbnail_size(&self) -> Result<Size, ConfigError> {
        Ok(Size::new(
            positive("thumbnail.width", self.thumbnail.width)?,
            positive("thumbnail.height", self.thumbnail.height)?,
        ))
    }

    pub fn thumbnail_params(&self) -> Result<ThumbnailParams, ConfigError> {
        if self.thumbnail.quality > 100 {
            return Err(ConfigError::Validation(
                "thumbnail.quality must be 0-100".into(),
            ));
        }
        ThumbnailParams::new(
            self.thumbnail_size()?,
            Quality::new(self.thumbnail.quality),
            self.thumbnail.mode,
        )
    }

    pub fn margins(&self) -> Result<Margins, ConfigError> {
        let m = &self.grid.margins;
        Ok(Margins::new(
            non_negative("grid.margins.left", m.left)?,
            non_negative("grid.margins.top", m.top)?,
            non_negative("grid.margins.right", m.right)?,
            non_negative("grid.margins.bottom", m.bottom)?,
        ))
    }

    pub fn grid_spec(&self) -> Result<GridSpec, ConfigError> {
        GridSpec::new(
            self.thumbnail_size()?,
            non_negative("grid.spacing", self.grid.spacing)?,
            self.margins()?,
        )
    }

    pub fn columns_hint(&self) -> Result<u32, ConfigError> {
        grid_hint("grid.columns", self.grid.columns)
    }

    pub fn rows_hint(&self) -> Result<u32, ConfigError> {
        grid_hint("grid.rows", self.grid.rows)
    }

    /// Cache root: the configured one, or `<platform cache>/wallgrid/thumbnails`.
    pub fn cache_root(&self) -> PathBuf {
        self.cache.root.clone().unwrap_or_else(default_cache_root)
    }

    /// Validate every value before anything touches the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thumbnail_params()?;
        self.grid_spec()?;
        self.columns_hint()?;
        self.rows_hint()?;
        Ok(())
    }
}

fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("wallgrid")
        .join("thumbnails")
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(GalleryConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<GalleryConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when absent.
pub fn load_config(path: &Path) -> Result<GalleryConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `wallgrid.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# wallgrid configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnail]
# Box every thumbnail is rendered into, in pixels. 1 to 16384.
width = 240
height = 135

# JPEG encoding quality (0 = worst, 100 = best).
quality = 90

# "fill" scales to cover the box and centre-crops to the exact size.
# "fit" scales to fit inside the box; one edge may come out shorter.
# Changing any thumbnail setting regenerates the whole cache.
mode = "fill"

# ---------------------------------------------------------------------------
# Grid
# ---------------------------------------------------------------------------
[grid]
# Gap between cells, in pixels. 0 to 16384, as are the margins below.
spacing = 30

# Column and row counts used before the first resize. Rows only size the
# preferred initial window; the real row count follows the image count.
# 1 to 1000 each.
columns = 4
rows = 4

# Space around the whole grid, in pixels.
[grid.margins]
left = 50
top = 30
right = 50
bottom = 30

# ---------------------------------------------------------------------------
# Cache
# ---------------------------------------------------------------------------
[cache]
# Directory holding cached thumbnails and the cache manifest.
# Omit to use <platform cache dir>/wallgrid/thumbnails.
# root = "/path/to/cache"

# ---------------------------------------------------------------------------
# Sources
# ---------------------------------------------------------------------------
[scan]
# Directory holding the source images.
root = "wallpapers"

# Descend into subdirectories.
recursive = false

# Gallery order: "name" (file name, ascending) or "newest" (mtime, descending).
order = "name"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel thumbnail workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
