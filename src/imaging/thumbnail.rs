//! Thumbnail rendering and atomic writes.
//!
//! | Step | Crate / function |
//! |---|---|
//! | Decode | [`DecoderRegistry`] (sniffed `image` codecs) |
//! | Fill | `DynamicImage::resize_to_fill`, Lanczos3 |
//! | Fit | `DynamicImage::resize`, Lanczos3 |
//! | Encode | `image::codecs::jpeg::JpegEncoder` |
//! | Write | `tempfile::NamedTempFile` in the target dir, then `persist` (rename) |

use super::decoder::{DecodeError, DecoderRegistry};
use super::params::{ResizeMode, ThumbnailParams};
use crate::types::Size;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Extension of every cached thumbnail file.
pub const THUMBNAIL_EXTENSION: &str = "jpg";

/// Decode `source` and scale it according to `params`.
pub fn render_thumbnail(
    decoders: &DecoderRegistry,
    source: &Path,
    params: &ThumbnailParams,
) -> Result<DynamicImage, DecodeError> {
    let img = decoders.decode_file(source)?;
    let Size { width, height } = params.size();
    let scaled = match params.mode() {
        ResizeMode::Fill => img.resize_to_fill(width, height, FilterType::Lanczos3),
        ResizeMode::Fit => img.resize(width, height, FilterType::Lanczos3),
    };
    // JPEG has no alpha channel.
    Ok(DynamicImage::ImageRgb8(scaled.to_rgb8()))
}

/// Encode `img` as JPEG and atomically replace `dest` with it.
///
/// The bytes land in a temp file next to `dest` and are renamed into place,
/// so readers never observe a half-written thumbnail.
pub fn write_thumbnail(img: &DynamicImage, dest: &Path, quality: u32) -> io::Result<()> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        let quality = u8::try_from(quality.clamp(1, 100)).unwrap_or(90);
        let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
        img.write_with_encoder(encoder).map_err(io::Error::other)?;
        writer.flush()?;
    }
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}
