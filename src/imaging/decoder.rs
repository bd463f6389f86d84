//! Image decoding as a pluggable capability.
//!
//! Each supported format is one [`ImageDecoder`]. The [`DecoderRegistry`]
//! picks a decoder for a file by sniffing its leading bytes first and
//! falling back to the file extension. Wallpaper dumps such as Windows
//! Spotlight assets carry no extension at all, so sniffing cannot be an
//! afterthought. New formats are added by registering another decoder; the
//! cache never looks at formats.

use image::{DynamicImage, ImageFormat};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A source image that could not be turned into pixels.
///
/// Never fatal to a refresh: the source is skipped and reported.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("cannot read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no decoder recognises {}", .path.display())]
    Unsupported { path: PathBuf },
    #[error("failed to decode {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
}

impl DecodeError {
    /// The source file the failure refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::Unreadable { path, .. }
            | Self::Unsupported { path }
            | Self::Corrupt { path, .. } => path,
        }
    }
}

/// One decodable image format.
pub trait ImageDecoder: Send + Sync {
    /// Short human-readable name, e.g. `"jpeg"`.
    fn name(&self) -> &str;

    /// Lowercase file extensions this decoder claims.
    fn extensions(&self) -> &[&str];

    /// Whether `header` (the first bytes of a file) looks like this format.
    fn sniff(&self, header: &[u8]) -> bool;

    /// Decode a complete file.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, String>;
}

/// Decoder backed by one of the `image` crate's built-in codecs.
pub struct RasterDecoder {
    name: &'static str,
    format: ImageFormat,
}

impl RasterDecoder {
    pub const fn new(name: &'static str, format: ImageFormat) -> Self {
        Self { name, format }
    }
}

impl ImageDecoder for RasterDecoder {
    fn name(&self) -> &str {
        self.name
    }

    fn extensions(&self) -> &[&str] {
        self.format.extensions_str()
    }

    fn sniff(&self, header: &[u8]) -> bool {
        image::guess_format(header).is_ok_and(|f| f == self.format)
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, String> {
        image::load_from_memory_with_format(bytes, self.format).map_err(|e| e.to_string())
    }
}

/// Formats registered by [`DecoderRegistry::with_defaults`].
const BUILTIN_FORMATS: &[(&str, ImageFormat)] = &[
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("webp", ImageFormat::WebP),
    ("tiff", ImageFormat::Tiff),
    ("bmp", ImageFormat::Bmp),
    ("gif", ImageFormat::Gif),
];

/// Ordered set of decoders. Earlier registrations win ties.
pub struct DecoderRegistry {
    decoders: Vec<Box<dyn ImageDecoder>>,
}

impl DecoderRegistry {
    pub fn empty() -> Self {
        Self {
            decoders: Vec::new(),
        }
    }

    /// Every built-in format whose decoder is compiled in.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for &(name, format) in BUILTIN_FORMATS {
            if format.reading_enabled() {
                registry.register(RasterDecoder::new(name, format));
            }
        }
        registry
    }

    pub fn register(&mut self, decoder: impl ImageDecoder + 'static) {
        self.decoders.push(Box::new(decoder));
    }

    pub fn with(mut self, decoder: impl ImageDecoder + 'static) -> Self {
        self.register(decoder);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.decoders.iter().map(|d| d.name()).collect()
    }

    /// Whether any decoder claims the extension (case-insensitive).
    pub fn supports_extension(&self, ext: &str) -> bool {
        self.by_extension(ext).is_some()
    }

    fn by_extension(&self, ext: &str) -> Option<&dyn ImageDecoder> {
        let ext = ext.to_ascii_lowercase();
        self.decoders
            .iter()
            .find(|d| d.extensions().contains(&ext.as_str()))
            .map(|d| &**d)
    }

    /// Pick a decoder: content sniffing first, extension second.
    pub fn select(&self, path: &Path, header: &[u8]) -> Option<&dyn ImageDecoder> {
        self.decoders
            .iter()
            .find(|d| d.sniff(header))
            .map(|d| &**d)
            .or_else(|| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .and_then(|e| self.by_extension(e))
            })
    }

    /// Read and decode a file from disk.
    pub fn decode_file(&self, path: &Path) -> Result<DynamicImage, DecodeError> {
        let bytes = std::fs::read(path).map_err(|source| DecodeError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let decoder = self
            .select(path, &bytes)
            .ok_or_else(|| DecodeError::Unsupported {
                path: path.to_path_buf(),
            })?;
        decoder.decode(&bytes).map_err(|reason| DecodeError::Corrupt {
            path: path.to_path_buf(),
            reason,
        })
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
