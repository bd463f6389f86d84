//! Image processing: decode, scale, encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Select decoder** | [`DecoderRegistry`]: header sniffing, then extension |
//! | **Decode** | `image` codecs (JPEG, PNG, WebP, TIFF, BMP, GIF) |
//! | **Thumbnail** | `resize_to_fill` or `resize`, Lanczos3 |
//! | **Encode** | JPEG, written atomically |
//!
//! The module is split into:
//! - **Decoder**: [`ImageDecoder`] trait + [`RasterDecoder`] + [`DecoderRegistry`]
//! - **Parameters**: [`ThumbnailParams`], [`Quality`], [`ResizeMode`]
//! - **Thumbnail**: rendering and atomic file writes

pub mod decoder;
mod params;
pub mod thumbnail;

pub use decoder::{DecodeError, DecoderRegistry, ImageDecoder, RasterDecoder};
pub use params::{Quality, ResizeMode, ThumbnailParams};
pub use thumbnail::{THUMBNAIL_EXTENSION, render_thumbnail, write_thumbnail};
