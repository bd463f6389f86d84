//! Source discovery.
//!
//! Lists the wallpapers under the configured root. A file is a candidate
//! when a registered decoder claims its extension, or when it has no
//! extension at all (Spotlight-style assets), in which case decoding relies
//! on header sniffing. Hidden entries are ignored, as are hidden
//! directories when recursing.
//!
//! Thumbnails of a cache root that sits inside the wallpaper folder are
//! never sources, so the cache cannot feed on its own output.
//!
//! The scan does not open files; whether a candidate actually decodes is
//! the cache's concern.

use crate::cache::is_cache_file;
use crate::config::{ScanConfig, SortOrder};
use crate::imaging::DecoderRegistry;
use crate::types::SourceImage;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot walk source directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Collect the source images described by `config`, in display order.
pub fn scan_sources(
    config: &ScanConfig,
    decoders: &DecoderRegistry,
) -> Result<Vec<SourceImage>, ScanError> {
    let max_depth = if config.recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(&config.root)
        .follow_links(true)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    let mut sources = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file()
            || !is_candidate(entry.path(), decoders)
            || is_cache_file(entry.path())
        {
            continue;
        }
        match SourceImage::from_path(entry.path()) {
            Ok(source) => sources.push(source),
            // Vanished between listing and stat.
            Err(e) => warn!(file = %entry.path().display(), error = %e, "skipping source"),
        }
    }

    sort_sources(&mut sources, config.order);
    debug!(root = %config.root.display(), count = sources.len(), "scanned sources");
    Ok(sources)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_candidate(path: &Path, decoders: &DecoderRegistry) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => decoders.supports_extension(ext),
        None => true,
    }
}

fn sort_sources(sources: &mut [SourceImage], order: SortOrder) {
    match order {
        SortOrder::Name => sources.sort_by(|a, b| a.path.cmp(&b.path)),
        SortOrder::Newest => sources.sort_by(|a, b| {
            let key = |s: &SourceImage| (s.signature.modified_secs, s.signature.modified_nanos);
            key(b).cmp(&key(a)).then_with(|| a.path.cmp(&b.path))
        }),
    }
}
