//! # Wallgrid
//!
//! The thumbnail cache and grid layout engine behind a wallpaper browser.
//! Point it at a folder of wallpapers and it keeps a directory of small,
//! uniformly sized JPEG thumbnails in step with that folder, then arranges
//! them in a grid whose column count follows the window width.
//!
//! # Architecture
//!
//! ```text
//! 1. Scan       wallpapers/  →  Vec<SourceImage>     (what exists, in display order)
//! 2. Refresh    sources      →  Vec<GalleryImage>    (cache reconciled, thumbnails on disk)
//! 3. Layout     viewport     →  LayoutResult         (columns, rows, canvas size)
//! ```
//!
//! Refresh runs once per startup. Layout runs on every resize, is pure, and
//! only reports a new layout when the column count changes.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Lists candidate wallpapers under the configured root |
//! | [`cache`] | Durable thumbnail cache: freshness checks, regeneration, pruning |
//! | [`layout`] | Pure grid math: columns, rows, canvas size, placements |
//! | [`controller`] | Refresh once, relayout on resize |
//! | [`worker`] | Runs refreshes on a background thread |
//! | [`imaging`] | Pluggable decoders, thumbnail rendering, atomic JPEG writes |
//! | [`config`] | `wallgrid.toml` loading, defaults, validation |
//! | [`types`] | Shared value types (`Size`, `SourceImage`, `GalleryImage`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Cache Is the Source of Truth for Thumbnails
//!
//! Every refresh fully reconciles the cache directory with the current
//! source list: stale thumbnails are rebuilt, missing ones created, and
//! thumbnails of vanished sources deleted. A consumer never has to wonder
//! whether a file under the cache root belongs to something that still
//! exists.
//!
//! ## Skip and Report, Never Swallow
//!
//! A wallpaper that fails to decode is left out of the grid, and the failure
//! is returned alongside the gallery so callers can show it. Only a cache
//! directory that cannot be written is fatal.
//!
//! ## Pure Layout
//!
//! [`layout`] has no state and performs no I/O. The [`controller`] keeps the
//! current column count and compares against it, which is what makes
//! "resize without a column change" a no-op.

pub mod cache;
pub mod config;
pub mod controller;
pub mod imaging;
pub mod layout;
pub mod output;
pub mod scan;
pub mod types;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_helpers;
