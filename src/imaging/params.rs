//! Parameter types for thumbnail rendering.
//!
//! - [`Quality`]: JPEG encoding quality (1 to 100, default 90). Clamped on construction.
//! - [`ResizeMode`]: how a source is fitted into the thumbnail box.
//! - [`ThumbnailParams`]: the complete, validated recipe every cache entry is rendered with.

use crate::config::ConfigError;
use crate::types::Size;
use serde::{Deserialize, Serialize};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// How a source image is fitted into the target thumbnail size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Scale to cover the box, then centre-crop to the exact size.
    #[default]
    Fill,
    /// Scale to fit inside the box, preserving aspect ratio. One edge may
    /// come out shorter than the target.
    Fit,
}

impl ResizeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fill => "fill",
            Self::Fit => "fit",
        }
    }
}

/// Recipe shared by every entry of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailParams {
    size: Size,
    quality: Quality,
    mode: ResizeMode,
}

impl ThumbnailParams {
    pub fn new(size: Size, quality: Quality, mode: ResizeMode) -> Result<Self, ConfigError> {
        if size.width == 0 || size.height == 0 {
            return Err(ConfigError::Validation(format!(
                "thumbnail size must be positive, got {size}"
            )));
        }
        Ok(Self {
            size,
            quality,
            mode,
        })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn mode(&self) -> ResizeMode {
        self.mode
    }
}
