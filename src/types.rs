//! Shared value types used across the cache, layout, and controller.
//!
//! [`Size`] is the geometry currency of the whole crate. [`SourceImage`]
//! is what the source collaborator hands to the cache, and
//! [`GalleryImage`] is what the cache hands back.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// An immutable width/height pair in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Modification signature of a source file.
///
/// Length plus modification time. Touching a file changes it even when the
/// bytes are identical, which is exactly when callers expect a rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSignature {
    pub len: u64,
    pub modified_secs: u64,
    pub modified_nanos: u32,
}

impl SourceSignature {
    /// Read the signature from filesystem metadata.
    pub fn read(path: &Path) -> io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        let modified = meta
            .modified()?
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Ok(Self {
            len: meta.len(),
            modified_secs: modified.as_secs(),
            modified_nanos: modified.subsec_nanos(),
        })
    }
}

/// One image of the source collection, as discovered by a scan.
///
/// `path` is the identity: two sources with the same path are the same
/// image. Paths are made absolute on construction so the identity does not
/// depend on the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub path: PathBuf,
    pub signature: SourceSignature,
}

impl SourceImage {
    pub fn new(path: impl AsRef<Path>, signature: SourceSignature) -> io::Result<Self> {
        Ok(Self {
            path: std::path::absolute(path)?,
            signature,
        })
    }

    /// Build a source from a file on disk, reading its current signature.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let signature = SourceSignature::read(path.as_ref())?;
        Self::new(path, signature)
    }
}

/// A valid cached thumbnail, in gallery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryImage {
    /// Zero-based position in the gallery; drives row-major placement.
    pub index: usize,
    pub cached_path: PathBuf,
    pub source: PathBuf,
    /// Actual pixel size of the cached thumbnail.
    pub size: Size,
}
