//! Shared test utilities: synthetic image fixtures and source builders.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let wallpapers = wallpaper_dir(&tmp, &["a.jpg", "b.jpg"]);
//! let sources = sources_in(&wallpapers, &["a.jpg", "b.jpg"]);
//! ```

use image::{ImageEncoder, RgbImage};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use crate::types::SourceImage;

// =========================================================================
// Fixture writers
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Write a small valid JPEG with the given dimensions.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a small valid PNG with the given dimensions.
pub fn write_png(path: &Path, width: u32, height: u32) {
    gradient(width, height).save_with_format(path, image::ImageFormat::Png).unwrap();
}

/// Push a file's modification time forward, as `touch` would.
pub fn touch(path: &Path) {
    let file = std::fs::File::options().write(true).open(path).unwrap();
    let later = SystemTime::now() + Duration::from_secs(3600);
    file.set_modified(later).unwrap();
}

// =========================================================================
// Source collections
// =========================================================================

/// Create `<tmp>/wallpapers` holding one 320x180 JPEG per name.
pub fn wallpaper_dir(tmp: &TempDir, names: &[&str]) -> PathBuf {
    let dir = tmp.path().join("wallpapers");
    std::fs::create_dir_all(&dir).unwrap();
    for name in names {
        write_jpeg(&dir.join(name), 320, 180);
    }
    dir
}

/// Build sources for `names` inside `dir`, in the given order.
pub fn sources_in(dir: &Path, names: &[&str]) -> Vec<SourceImage> {
    names
        .iter()
        .map(|name| SourceImage::from_path(dir.join(name)).unwrap())
        .collect()
}

/// All regular files in a directory, sorted by name.
pub fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
