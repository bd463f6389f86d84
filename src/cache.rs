//! Durable thumbnail cache.
//!
//! Maps each source image to a pre-sized JPEG under a cache root, and keeps
//! those files in step with the source collection on every
//! [`ThumbnailCache::refresh`].
//!
//! # Design
//!
//! ## File names
//!
//! A thumbnail lives at `<root>/<sha256(source path)>.jpg`. The name depends
//! only on the source identity, so regenerating an entry overwrites the same
//! file and repeated refreshes never accumulate duplicates.
//!
//! ## Freshness
//!
//! The manifest records, per file, the source's modification signature (length
//! + mtime) and a hash of the thumbnail parameters. A lookup is a hit only when
//! 1. an entry for the file exists,
//! 2. the recorded signature equals the source's current one,
//! 3. the recorded params hash equals the cache's current one, and
//! 4. the thumbnail file is still on disk.
//!
//! Anything else is regenerated before `refresh` returns, so a stale
//! thumbnail is never handed out. Signatures are mtime-based rather than
//! content-based: touching a file is an explicit request to rebuild it.
//!
//! ## Failures
//!
//! A source that cannot be decoded is skipped and reported in
//! [`RefreshOutcome::skipped`]. Its previous thumbnail, if any, is removed.
//! Failing to create or write into the cache directory aborts the refresh
//! with [`CacheError::Io`].
//!
//! ## Pruning
//!
//! Entries whose source is absent from the current refresh are deleted in the
//! same call, together with orphaned thumbnail files and temp files left by
//! interrupted writes.
//!
//! ## Storage
//!
//! The manifest is a JSON file at `<root>/.cache-manifest.json`, rewritten
//! only when something changed. An unreadable or outdated manifest counts as
//! empty: every thumbnail is rebuilt once.

use crate::imaging::{
    DecodeError, DecoderRegistry, THUMBNAIL_EXTENSION, ThumbnailParams, render_thumbnail,
    write_thumbnail,
};
use crate::types::{GalleryImage, Size, SourceImage, SourceSignature};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name of the cache manifest file within the cache root.
const MANIFEST_FILENAME: &str = ".cache-manifest.json";

/// Version of the cache manifest format. Bump this to invalidate all
/// existing caches when the format or key computation changes.
const MANIFEST_VERSION: u32 = 2;

/// Prefix `tempfile` gives to in-flight writes.
const TEMP_PREFIX: &str = ".tmp";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache directory {} is not usable: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cache manifest encoding failed: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("refresh worker stopped before answering")]
    WorkerStopped,
}

impl CacheError {
    fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A single cached thumbnail.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    /// Hex of the source path's raw bytes. Lossless for any file name.
    pub source_key: String,
    /// Human-readable source path. May be lossy; never compared.
    pub source: String,
    pub signature: SourceSignature,
    pub params_hash: String,
    pub size: Size,
    /// Unix seconds.
    pub generated_at: u64,
}

impl CacheEntry {
    fn is_fresh(&self, source: &SourceImage, params_hash: &str) -> bool {
        self.source_key == source_key(&source.path)
            && self.signature == source.signature
            && self.params_hash == params_hash
    }
}

/// On-disk manifest mapping thumbnail file names to their entries.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
}

impl CacheManifest {
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
        }
    }

    /// Load from the cache root. Returns an empty manifest if the file
    /// doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(root: &Path) -> Self {
        let content = match std::fs::read_to_string(manifest_path(root)) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(m) if m.version == MANIFEST_VERSION => m,
            _ => Self::empty(),
        }
    }

    /// Save to the cache root, atomically.
    pub fn save(&self, root: &Path) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut tmp = tempfile::NamedTempFile::new_in(root).map_err(|e| CacheError::io(root, e))?;
        io::Write::write_all(&mut tmp, json.as_bytes()).map_err(|e| CacheError::io(root, e))?;
        tmp.persist(manifest_path(root))
            .map_err(|e| CacheError::io(root, e.error))?;
        Ok(())
    }
}

/// Resolve the cache manifest path for a cache root.
pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILENAME)
}

/// Deterministic thumbnail file name for a source identity.
///
/// Hashes the raw path bytes, so names that differ only in non-UTF-8 bytes
/// still map to different files.
pub fn cache_file_name(source: &Path) -> String {
    let digest = Sha256::digest(source.as_os_str().as_encoded_bytes());
    format!("{:x}.{}", digest, THUMBNAIL_EXTENSION)
}

/// Lossless, serializable form of a source path.
pub fn source_key(source: &Path) -> String {
    source
        .as_os_str()
        .as_encoded_bytes()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Whether `path` is a thumbnail inside a cache root.
///
/// Used by the scanner so a cache living under the wallpaper folder never
/// feeds its own thumbnails back in as sources.
pub fn is_cache_file(path: &Path) -> bool {
    let is_artifact = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(is_cache_artifact);
    is_artifact && path.parent().is_some_and(|dir| manifest_path(dir).is_file())
}

/// Whether a file name in the cache root was produced by this cache.
fn is_cache_artifact(name: &str) -> bool {
    if name.starts_with(TEMP_PREFIX) {
        return true;
    }
    match name.split_once('.') {
        Some((stem, ext)) => {
            ext == THUMBNAIL_EXTENSION
                && stem.len() == 64
                && stem.bytes().all(|b| b.is_ascii_hexdigit())
        }
        None => false,
    }
}

/// SHA-256 of the thumbnail recipe. Any change re-renders every entry.
pub fn hash_thumbnail_params(params: &ThumbnailParams) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"thumbnail\0");
    hasher.update(params.size().width.to_le_bytes());
    hasher.update(params.size().height.to_le_bytes());
    hasher.update(params.quality().value().to_le_bytes());
    hasher.update(params.mode().as_str().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Progress notifications emitted during a refresh.
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// Thumbnail was fresh and reused.
    Hit { source: PathBuf },
    /// Thumbnail was missing or stale and has been written.
    Generated { source: PathBuf, size: Size },
    /// Source could not be decoded and is left out of the gallery.
    Skipped { source: PathBuf, reason: String },
    /// Cache file with no current source was deleted.
    Pruned { file: PathBuf },
}

/// Summary of cache activity for one refresh.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub generated: u32,
    pub skipped: u32,
    pub pruned: u32,
}

impl CacheStats {
    pub fn total(&self) -> u32 {
        self.hits + self.generated + self.skipped
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cached, {} generated ({} total)",
            self.hits,
            self.generated,
            self.total()
        )?;
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        if self.pruned > 0 {
            write!(f, ", {} pruned", self.pruned)?;
        }
        Ok(())
    }
}

/// Result of a successful refresh.
#[derive(Debug)]
pub struct RefreshOutcome {
    /// Valid thumbnails in source order.
    pub images: Vec<GalleryImage>,
    /// Sources left out because they could not be decoded.
    pub skipped: Vec<DecodeError>,
    pub stats: CacheStats,
}

/// Why a single regeneration failed.
enum RegenError {
    Decode(DecodeError),
    Write(PathBuf, io::Error),
}

/// Per-source work item computed before any thumbnail is rendered.
struct Slot<'a> {
    source: &'a SourceImage,
    file_name: String,
    fresh: bool,
}

/// Cache of rendered thumbnails rooted at one directory.
pub struct ThumbnailCache {
    root: PathBuf,
    params: ThumbnailParams,
    params_hash: String,
    decoders: DecoderRegistry,
    manifest: CacheManifest,
}

impl ThumbnailCache {
    /// Open a cache with the built-in decoders.
    ///
    /// No I/O beyond reading an existing manifest happens here; the root is
    /// created on the first refresh.
    pub fn open(root: impl Into<PathBuf>, params: ThumbnailParams) -> Self {
        Self::with_decoders(root, params, DecoderRegistry::with_defaults())
    }

    pub fn with_decoders(
        root: impl Into<PathBuf>,
        params: ThumbnailParams,
        decoders: DecoderRegistry,
    ) -> Self {
        let root = root.into();
        let manifest = CacheManifest::load(&root);
        Self {
            params_hash: hash_thumbnail_params(&params),
            root,
            params,
            decoders,
            manifest,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn params(&self) -> &ThumbnailParams {
        &self.params
    }

    pub fn decoders(&self) -> &DecoderRegistry {
        &self.decoders
    }

    /// Recorded entry for a source, if any.
    pub fn entry(&self, source: &Path) -> Option<&CacheEntry> {
        self.manifest.entries.get(&cache_file_name(source))
    }

    /// Bring the cache in line with `sources` and return the gallery.
    pub fn refresh(&mut self, sources: &[SourceImage]) -> Result<RefreshOutcome, CacheError> {
        self.refresh_with_events(sources, None)
    }

    /// [`refresh`](Self::refresh), streaming a [`CacheEvent`] per decision.
    pub fn refresh_with_events(
        &mut self,
        sources: &[SourceImage],
        events: Option<Sender<CacheEvent>>,
    ) -> Result<RefreshOutcome, CacheError> {
        let emit = |event: CacheEvent| {
            if let Some(tx) = &events {
                let _ = tx.send(event);
            }
        };

        std::fs::create_dir_all(&self.root).map_err(|e| CacheError::io(&self.root, e))?;

        let mut seen = HashSet::new();
        let slots: Vec<Slot<'_>> = sources
            .iter()
            .filter(|s| seen.insert(s.path.as_path()))
            .map(|source| {
                let file_name = cache_file_name(&source.path);
                let fresh = self.manifest.entries.get(&file_name).is_some_and(|entry| {
                    entry.is_fresh(source, &self.params_hash)
                        && self.root.join(&file_name).is_file()
                });
                Slot {
                    source,
                    file_name,
                    fresh,
                }
            })
            .collect();

        // Stale entries render in parallel; each writes only its own file.
        let rendered: Vec<Option<Result<Size, RegenError>>> = slots
            .par_iter()
            .map(|slot| (!slot.fresh).then(|| self.regenerate(slot)))
            .collect();

        let mut stats = CacheStats::default();
        let mut skipped = Vec::new();
        let mut images = Vec::new();
        let mut dirty = false;
        let mut write_failure = None;

        for (slot, result) in slots.iter().zip(rendered) {
            let path = &slot.source.path;
            match result {
                None => {
                    debug!(source = %path.display(), "thumbnail cache hit");
                    stats.hits += 1;
                    emit(CacheEvent::Hit {
                        source: path.clone(),
                    });
                }
                Some(Ok(size)) => {
                    info!(source = %path.display(), %size, "generated thumbnail");
                    stats.generated += 1;
                    self.manifest.entries.insert(
                        slot.file_name.clone(),
                        CacheEntry {
                            source_key: source_key(path),
                            source: path.to_string_lossy().into_owned(),
                            signature: slot.source.signature,
                            params_hash: self.params_hash.clone(),
                            size,
                            generated_at: unix_now(),
                        },
                    );
                    dirty = true;
                    emit(CacheEvent::Generated {
                        source: path.clone(),
                        size,
                    });
                }
                Some(Err(RegenError::Decode(err))) => {
                    warn!(source = %path.display(), error = %err, "skipping undecodable source");
                    stats.skipped += 1;
                    if self.manifest.entries.remove(&slot.file_name).is_some() {
                        dirty = true;
                    }
                    remove_quietly(&self.root.join(&slot.file_name));
                    emit(CacheEvent::Skipped {
                        source: path.clone(),
                        reason: err.to_string(),
                    });
                    skipped.push(err);
                    continue;
                }
                Some(Err(RegenError::Write(dest, err))) => {
                    if write_failure.is_none() {
                        write_failure = Some(CacheError::io(dest, err));
                    }
                    continue;
                }
            }

            if let Some(entry) = self.manifest.entries.get(&slot.file_name) {
                images.push(GalleryImage {
                    index: images.len(),
                    cached_path: self.root.join(&slot.file_name),
                    source: path.clone(),
                    size: entry.size,
                });
            }
        }

        if let Some(err) = write_failure {
            // Keep what was written so far; the next refresh resumes from it.
            if dirty && let Err(e) = self.manifest.save(&self.root) {
                warn!(root = %self.root.display(), error = %e, "could not save cache manifest");
            }
            return Err(err);
        }

        let keep: HashSet<&str> = slots.iter().map(|s| s.file_name.as_str()).collect();
        let pruned = self.prune(&keep)?;
        for file in pruned {
            info!(file = %file.display(), "pruned thumbnail");
            stats.pruned += 1;
            dirty = true;
            emit(CacheEvent::Pruned { file });
        }

        if dirty {
            self.manifest.save(&self.root)?;
        }

        Ok(RefreshOutcome {
            images,
            skipped,
            stats,
        })
    }

    fn regenerate(&self, slot: &Slot<'_>) -> Result<Size, RegenError> {
        let img = render_thumbnail(&self.decoders, &slot.source.path, &self.params)
            .map_err(RegenError::Decode)?;
        let dest = self.root.join(&slot.file_name);
        write_thumbnail(&img, &dest, self.params.quality().value())
            .map_err(|e| RegenError::Write(dest, e))?;
        Ok(Size::new(img.width(), img.height()))
    }

    /// Delete entries and cache files not named in `keep`.
    ///
    /// Returns the thumbnail files removed. Leftover temp files are removed
    /// too but not reported.
    fn prune(&mut self, keep: &HashSet<&str>) -> Result<Vec<PathBuf>, CacheError> {
        let mut removed = Vec::new();

        self.manifest.entries.retain(|name, _| {
            let retain = keep.contains(name.as_str());
            if !retain {
                let file = self.root.join(name);
                remove_quietly(&file);
                removed.push(file);
            }
            retain
        });

        let listing = std::fs::read_dir(&self.root).map_err(|e| CacheError::io(&self.root, e))?;
        for dir_entry in listing.flatten() {
            let name = dir_entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if keep.contains(name) || !is_cache_artifact(name) {
                continue;
            }
            let file = dir_entry.path();
            if !file.is_file() {
                continue;
            }
            remove_quietly(&file);
            if !name.starts_with(TEMP_PREFIX) && !removed.contains(&file) {
                removed.push(file);
            }
        }

        Ok(removed)
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = std::fs::remove_file(path)
        && e.kind() != io::ErrorKind::NotFound
    {
        warn!(file = %path.display(), error = %e, "could not remove cache file");
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::decoder::tests::CountingDecoder;
    use crate::imaging::{Quality, ResizeMode};
    use crate::test_helpers::{files_in, sources_in, touch, wallpaper_dir, write_jpeg};
    use std::fs;
    use tempfile::TempDir;

    fn params() -> ThumbnailParams {
        ThumbnailParams::new(Size::new(48, 27), Quality::new(80), ResizeMode::Fill).unwrap()
    }

    fn counting_cache(root: &Path) -> (ThumbnailCache, CountingDecoder) {
        let counting = CountingDecoder::default();
        let decoders = DecoderRegistry::empty().with(counting.clone());
        (ThumbnailCache::with_decoders(root, params(), decoders), counting)
    }

    fn read_all(root: &Path) -> Vec<(String, Vec<u8>)> {
        files_in(root)
            .into_iter()
            .map(|name| {
                let bytes = fs::read(root.join(&name)).unwrap();
                (name, bytes)
            })
            .collect()
    }

    // =========================================================================
    // Naming and hashing
    // =========================================================================

    #[test]
    fn cache_file_name_is_deterministic_hex() {
        let a = cache_file_name(Path::new("/walls/a.jpg"));
        assert_eq!(a, cache_file_name(Path::new("/walls/a.jpg")));
        assert_ne!(a, cache_file_name(Path::new("/walls/b.jpg")));
        assert!(a.ends_with(".jpg"));
        assert!(is_cache_artifact(&a));
    }

    #[test]
    fn artifact_detection_spares_foreign_files() {
        assert!(is_cache_artifact(".tmpA1b2C3"));
        assert!(!is_cache_artifact("notes.txt"));
        assert!(!is_cache_artifact("holiday.jpg"));
        assert!(!is_cache_artifact(MANIFEST_FILENAME));
    }

    #[test]
    fn params_hash_varies_with_each_setting() {
        let base = hash_thumbnail_params(&params());
        let bigger =
            ThumbnailParams::new(Size::new(96, 54), Quality::new(80), ResizeMode::Fill).unwrap();
        let sharper =
            ThumbnailParams::new(Size::new(48, 27), Quality::new(95), ResizeMode::Fill).unwrap();
        let fit = ThumbnailParams::new(Size::new(48, 27), Quality::new(80), ResizeMode::Fit).unwrap();
        assert_eq!(base, hash_thumbnail_params(&params()));
        assert_ne!(base, hash_thumbnail_params(&bigger));
        assert_ne!(base, hash_thumbnail_params(&sharper));
        assert_ne!(base, hash_thumbnail_params(&fit));
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    #[test]
    fn refresh_generates_in_source_order() {
        let tmp = TempDir::new().unwrap();
        let dir = wallpaper_dir(&tmp, &["b.jpg", "a.jpg", "c.jpg"]);
        let sources = sources_in(&dir, &["c.jpg", "a.jpg", "b.jpg"]);
        let mut cache = ThumbnailCache::open(tmp.path().join("cache"), params());

        let outcome = cache.refresh(&sources).unwrap();

        let order: Vec<_> = outcome.images.iter().map(|i| i.source.clone()).collect();
        let expected: Vec<_> = sources.iter().map(|s| s.path.clone()).collect();
        assert_eq!(order, expected);
        for (i, image) in outcome.images.iter().enumerate() {
            assert_eq!(image.index, i);
            assert!(image.cached_path.is_file());
            assert_eq!(image.size, Size::new(48, 27));
        }
        assert_eq!(outcome.stats.generated, 3);
        assert!(manifest_path(cache.root()).is_file());
    }

    #[test]
    fn refresh_twice_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let dir = wallpaper_dir(&tmp, &["a.jpg", "b.jpg"]);
        let sources = sources_in(&dir, &["a.jpg", "b.jpg"]);
        let root = tmp.path().join("cache");
        let (mut cache, counting) = counting_cache(&root);

        let first = cache.refresh(&sources).unwrap();
        let files_after_first = read_all(&root);
        assert_eq!(counting.count(), 2);

        let second = cache.refresh(&sources).unwrap();
        assert_eq!(counting.count(), 2, "nothing should be decoded again");
        assert_eq!(first.images, second.images);
        assert_eq!(read_all(&root), files_after_first);
        assert_eq!(second.stats.hits, 2);
        assert_eq!(second.stats.generated, 0);
    }

    #[test]
    fn refresh_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let dir = wallpaper_dir(&tmp, &["a.jpg"]);
        let sources = sources_in(&dir, &["a.jpg"]);
        let root = tmp.path().join("cache");

        ThumbnailCache::open(&root, params()).refresh(&sources).unwrap();

        let (mut reopened, counting) = counting_cache(&root);
        let outcome = reopened.refresh(&sources).unwrap();
        assert_eq!(counting.count(), 0);
        assert_eq!(outcome.stats.hits, 1);
    }

    #[test]
    fn touching_one_source_rewrites_only_that_entry() {
        let tmp = TempDir::new().unwrap();
        let dir = wallpaper_dir(&tmp, &["a.jpg", "b.jpg", "c.jpg"]);
        let root = tmp.path().join("cache");
        let (mut cache, counting) = counting_cache(&root);
        cache
            .refresh(&sources_in(&dir, &["a.jpg", "b.jpg", "c.jpg"]))
            .unwrap();

        // Replace the cached bytes so a rewrite is observable.
        let names: Vec<_> = ["a.jpg", "b.jpg", "c.jpg"]
            .iter()
            .map(|n| root.join(cache_file_name(&dir.join(n))))
            .collect();
        for path in &names {
            fs::write(path, b"marker").unwrap();
        }

        touch(&dir.join("b.jpg"));
        let outcome = cache
            .refresh(&sources_in(&dir, &["a.jpg", "b.jpg", "c.jpg"]))
            .unwrap();

        assert_eq!(counting.count(), 4);
        assert_eq!(outcome.stats.generated, 1);
        assert_eq!(fs::read(&names[0]).unwrap(), b"marker");
        assert_ne!(fs::read(&names[1]).unwrap(), b"marker");
        assert_eq!(fs::read(&names[2]).unwrap(), b"marker");
    }

    #[test]
    fn deleted_thumbnail_is_regenerated() {
        let tmp = TempDir::new().unwrap();
        let dir = wallpaper_dir(&tmp, &["a.jpg"]);
        let sources = sources_in(&dir, &["a.jpg"]);
        let root = tmp.path().join("cache");
        let (mut cache, counting) = counting_cache(&root);

        let first = cache.refresh(&sources).unwrap();
        fs::remove_file(&first.images[0].cached_path).unwrap();

        let second = cache.refresh(&sources).unwrap();
        assert_eq!(counting.count(), 2);
        assert!(second.images[0].cached_path.is_file());
    }

    #[test]
    fn changed_params_regenerate_everything() {
        let tmp = TempDir::new().unwrap();
        let dir = wallpaper_dir(&tmp, &["a.jpg", "b.jpg"]);
        let sources = sources_in(&dir, &["a.jpg", "b.jpg"]);
        let root = tmp.path().join("cache");
        ThumbnailCache::open(&root, params()).refresh(&sources).unwrap();

        let larger =
            ThumbnailParams::new(Size::new(64, 36), Quality::new(80), ResizeMode::Fill).unwrap();
        let outcome = ThumbnailCache::open(&root, larger).refresh(&sources).unwrap();
        assert_eq!(outcome.stats.generated, 2);
        assert!(outcome.images.iter().all(|i| i.size == Size::new(64, 36)));
    }

    #[test]
    fn removed_source_is_pruned() {
        let tmp = TempDir::new().unwrap();
        let dir = wallpaper_dir(&tmp, &["a.jpg", "b.jpg"]);
        let root = tmp.path().join("cache");
        let mut cache = ThumbnailCache::open(&root, params());

        let first = cache.refresh(&sources_in(&dir, &["a.jpg", "b.jpg"])).unwrap();
        let gone = first.images[1].cached_path.clone();

        let second = cache.refresh(&sources_in(&dir, &["a.jpg"])).unwrap();
        assert!(!gone.exists());
        assert_eq!(second.images.len(), 1);
        assert_eq!(second.stats.pruned, 1);
        assert!(cache.entry(&dir.join("b.jpg")).is_none());
    }

    #[test]
    fn orphans_and_temp_files_are_swept_but_foreign_files_kept() {
        let tmp = TempDir::new().unwrap();
        let dir = wallpaper_dir(&tmp, &["a.jpg"]);
        let root = tmp.path().join("cache");
        fs::create_dir_all(&root).unwrap();
        let orphan = root.join(cache_file_name(Path::new("/gone/wall.jpg")));
        fs::write(&orphan, b"old").unwrap();
        fs::write(root.join(".tmpXYZ123"), b"half").unwrap();
        fs::write(root.join("README.txt"), b"mine").unwrap();

        let mut cache = ThumbnailCache::open(&root, params());
        let outcome = cache.refresh(&sources_in(&dir, &["a.jpg"])).unwrap();

        assert!(!orphan.exists());
        assert!(!root.join(".tmpXYZ123").exists());
        assert!(root.join("README.txt").exists());
        assert_eq!(outcome.stats.pruned, 1);
    }

    #[test]
    fn duplicate_sources_collapse() {
        let tmp = TempDir::new().unwrap();
        let dir = wallpaper_dir(&tmp, &["a.jpg", "b.jpg"]);
        let sources = sources_in(&dir, &["a.jpg", "b.jpg", "a.jpg"]);
        let mut cache = ThumbnailCache::open(tmp.path().join("cache"), params());

        let outcome = cache.refresh(&sources).unwrap();
        assert_eq!(outcome.images.len(), 2);
        assert_eq!(outcome.images[0].source, dir.join("a.jpg"));
        assert_eq!(outcome.images[1].index, 1);
    }

    #[test]
    fn undecodable_source_is_skipped_and_reported() {
        let tmp = TempDir::new().unwrap();
        let dir = wallpaper_dir(&tmp, &["a.jpg", "c.jpg"]);
        fs::write(dir.join("b.jpg"), b"corrupt").unwrap();
        let sources = sources_in(&dir, &["a.jpg", "b.jpg", "c.jpg"]);
        let mut cache = ThumbnailCache::open(tmp.path().join("cache"), params());

        let outcome = cache.refresh(&sources).unwrap();
        assert_eq!(outcome.images.len(), 2);
        assert_eq!(outcome.images[1].source, dir.join("c.jpg"));
        assert_eq!(outcome.images[1].index, 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].path(), dir.join("b.jpg"));
        assert_eq!(outcome.stats.skipped, 1);
    }

    #[test]
    fn source_turning_corrupt_drops_old_thumbnail() {
        let tmp = TempDir::new().unwrap();
        let dir = wallpaper_dir(&tmp, &["a.jpg"]);
        let sources = sources_in(&dir, &["a.jpg"]);
        let mut cache = ThumbnailCache::open(tmp.path().join("cache"), params());
        let cached = cache.refresh(&sources).unwrap().images[0].cached_path.clone();

        fs::write(dir.join("a.jpg"), b"broken now").unwrap();
        touch(&dir.join("a.jpg"));
        let outcome = cache.refresh(&sources_in(&dir, &["a.jpg"])).unwrap();

        assert!(outcome.images.is_empty());
        assert!(!cached.exists());
        assert!(cache.entry(&dir.join("a.jpg")).is_none());
    }

    #[test]
    fn unusable_cache_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let dir = wallpaper_dir(&tmp, &["a.jpg"]);
        let blocker = tmp.path().join("not-a-dir");
        fs::write(&blocker, b"file").unwrap();

        let mut cache = ThumbnailCache::open(blocker.join("cache"), params());
        let err = cache.refresh(&sources_in(&dir, &["a.jpg"])).unwrap_err();
        match err {
            CacheError::Io { path, .. } => assert_eq!(path, blocker.join("cache")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn empty_source_list_empties_cache() {
        let tmp = TempDir::new().unwrap();
        let dir = wallpaper_dir(&tmp, &["a.jpg"]);
        let root = tmp.path().join("cache");
        let mut cache = ThumbnailCache::open(&root, params());
        cache.refresh(&sources_in(&dir, &["a.jpg"])).unwrap();

        let outcome = cache.refresh(&[]).unwrap();
        assert!(outcome.images.is_empty());
        assert_eq!(files_in(&root), vec![MANIFEST_FILENAME.to_string()]);
    }

    #[test]
    fn events_follow_decisions() {
        let tmp = TempDir::new().unwrap();
        let dir = wallpaper_dir(&tmp, &["a.jpg"]);
        write_jpeg(&dir.join("b.jpg"), 50, 50);
        let sources = sources_in(&dir, &["a.jpg", "b.jpg"]);
        let mut cache = ThumbnailCache::open(tmp.path().join("cache"), params());
        cache.refresh(&sources[..1]).unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        cache.refresh_with_events(&sources, Some(tx)).unwrap();
        let events: Vec<_> = rx.iter().collect();

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], CacheEvent::Hit { source } if *source == sources[0].path));
        assert!(matches!(&events[1], CacheEvent::Generated { size, .. } if *size == Size::new(48, 27)));
    }

    #[test]
    fn write_failure_keeps_earlier_entries_and_skips_pruning() {
        let tmp = TempDir::new().unwrap();
        let dir = wallpaper_dir(&tmp, &["a.jpg", "b.jpg"]);
        let root = tmp.path().join("cache");
        fs::create_dir_all(&root).unwrap();
        let orphan = root.join(cache_file_name(Path::new("/gone/wall.jpg")));
        fs::write(&orphan, b"old").unwrap();
        // A directory where b's thumbnail should go makes the rename fail.
        let blocked = root.join(cache_file_name(&dir.join("b.jpg")));
        fs::create_dir(&blocked).unwrap();

        let mut cache = ThumbnailCache::open(&root, params());
        let err = cache
            .refresh(&sources_in(&dir, &["a.jpg", "b.jpg"]))
            .unwrap_err();

        match err {
            CacheError::Io { path, .. } => assert_eq!(path, blocked),
            other => panic!("expected Io error, got {other:?}"),
        }
        let saved = CacheManifest::load(&root);
        assert!(saved.entries.contains_key(&cache_file_name(&dir.join("a.jpg"))));
        assert!(!saved.entries.contains_key(&cache_file_name(&dir.join("b.jpg"))));
        assert!(orphan.exists(), "pruning must not run after a failed write");
    }

    // =========================================================================
    // Non-UTF-8 source names
    // =========================================================================

    #[test]
    fn source_key_is_lossless_hex() {
        assert_eq!(source_key(Path::new("/a")), "2f61");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_source_is_cached_and_manifest_saved() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        let dir = wallpaper_dir(&tmp, &["a.jpg"]);
        let odd = dir.join(OsStr::from_bytes(b"caf\xe9.jpg"));
        write_jpeg(&odd, 64, 36);
        let sources = vec![
            SourceImage::from_path(dir.join("a.jpg")).unwrap(),
            SourceImage::from_path(&odd).unwrap(),
        ];
        let root = tmp.path().join("cache");

        let first = ThumbnailCache::open(&root, params()).refresh(&sources).unwrap();
        assert_eq!(first.images.len(), 2);
        assert_eq!(first.images[1].source, odd);

        let (mut reopened, counting) = counting_cache(&root);
        let second = reopened.refresh(&sources).unwrap();
        assert_eq!(counting.count(), 0);
        assert_eq!(second.stats.hits, 2);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn names_differing_in_invalid_bytes_get_distinct_files() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let e9 = Path::new(OsStr::from_bytes(b"/walls/caf\xe9.jpg"));
        let e8 = Path::new(OsStr::from_bytes(b"/walls/caf\xe8.jpg"));
        assert_ne!(cache_file_name(e9), cache_file_name(e8));
        assert_ne!(source_key(e9), source_key(e8));
    }

    #[test]
    fn cache_file_detection_needs_a_manifest() {
        let tmp = TempDir::new().unwrap();
        let thumb = tmp.path().join(cache_file_name(Path::new("/walls/a.jpg")));
        fs::write(&thumb, b"x").unwrap();
        assert!(!is_cache_file(&thumb));

        fs::write(manifest_path(tmp.path()), "{}").unwrap();
        assert!(is_cache_file(&thumb));
        assert!(!is_cache_file(&tmp.path().join("holiday.jpg")));
    }

    // =========================================================================
    // Manifest and stats
    // =========================================================================

    #[test]
    fn load_corrupt_manifest_returns_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(MANIFEST_FILENAME), "not json").unwrap();
        assert!(CacheManifest::load(tmp.path()).entries.is_empty());
    }

    #[test]
    fn load_wrong_version_returns_empty() {
        let tmp = TempDir::new().unwrap();
        let json = format!(r#"{{"version": {}, "entries": {{}}}}"#, MANIFEST_VERSION + 1);
        fs::write(tmp.path().join(MANIFEST_FILENAME), json).unwrap();
        let m = CacheManifest::load(tmp.path());
        assert_eq!(m.version, MANIFEST_VERSION);
    }

    #[test]
    fn cache_stats_display() {
        let s = CacheStats {
            hits: 5,
            generated: 2,
            skipped: 0,
            pruned: 0,
        };
        assert_eq!(s.to_string(), "5 cached, 2 generated (7 total)");

        let s = CacheStats {
            hits: 1,
            generated: 1,
            skipped: 1,
            pruned: 3,
        };
        assert_eq!(
            s.to_string(),
            "1 cached, 1 generated (3 total), 1 skipped, 3 pruned"
        );
    }
}
