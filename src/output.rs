//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every image is shown by its gallery position and file name first, with
//! paths as indented context lines. Sizes use `WxH` throughout.
//!
//! # Output Format
//!
//! ## Refresh progress
//!
//! ```text
//! cached     dawn.jpg
//! generated  sunset.jpg (240x135)
//! skipped    broken.jpg: failed to decode ...
//! pruned     3f9a...c1.jpg
//! ```
//!
//! ## Gallery
//!
//! ```text
//! Gallery (2 images)
//! 001 dawn.jpg (240x135)
//!     Thumbnail: /home/me/.cache/wallgrid/thumbnails/3f9a...c1.jpg
//! 002 sunset.jpg (240x135)
//!     Thumbnail: /home/me/.cache/wallgrid/thumbnails/77b0...9e.jpg
//!
//! Skipped
//!     failed to decode /walls/broken.jpg: ...
//!
//! 1 cached, 1 generated (2 total), 1 skipped
//! ```
//!
//! ## Layout
//!
//! ```text
//! Layout
//!     Columns: 3
//!     Rows: 1
//!     Canvas: 880x195
//!     Minimum: 340x195
//! Placements
//!     001 dawn.jpg → row 0, column 0
//!     002 sunset.jpg → row 0, column 1
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::cache::{CacheEvent, RefreshOutcome};
use crate::controller::{GalleryController, Relayout};
use crate::layout::LayoutResult;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Refresh
// ============================================================================

/// Format one refresh progress event as a status line.
pub fn format_cache_event(event: &CacheEvent) -> Vec<String> {
    let line = match event {
        CacheEvent::Hit { source } => format!("{:<10} {}", "cached", file_name(source)),
        CacheEvent::Generated { source, size } => {
            format!("{:<10} {} ({})", "generated", file_name(source), size)
        }
        CacheEvent::Skipped { source, reason } => {
            format!("{:<10} {}: {}", "skipped", file_name(source), reason)
        }
        CacheEvent::Pruned { file } => format!("{:<10} {}", "pruned", file_name(file)),
    };
    vec![line]
}

/// Format the gallery produced by a refresh, skipped sources, and stats.
pub fn format_gallery(outcome: &RefreshOutcome) -> Vec<String> {
    let mut lines = vec![format!("Gallery ({} images)", outcome.images.len())];
    for image in &outcome.images {
        lines.push(format!(
            "{} {} ({})",
            format_index(image.index + 1),
            file_name(&image.source),
            image.size
        ));
        lines.push(format!("    Thumbnail: {}", image.cached_path.display()));
    }

    if !outcome.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for err in &outcome.skipped {
            lines.push(format!("    {}", err));
        }
    }

    lines.push(String::new());
    lines.push(outcome.stats.to_string());
    lines
}

pub fn print_gallery(outcome: &RefreshOutcome) {
    for line in format_gallery(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Layout
// ============================================================================

fn layout_summary(layout: &LayoutResult) -> Vec<String> {
    vec![
        "Layout".to_string(),
        format!("    Columns: {}", layout.columns),
        format!("    Rows: {}", layout.rows),
        format!("    Canvas: {}", layout.full_size),
        format!("    Minimum: {}", layout.min_size),
    ]
}

/// Format the current layout and every image's grid cell.
pub fn format_layout(controller: &GalleryController) -> Vec<String> {
    let mut lines = layout_summary(&controller.layout());
    lines.push("Placements".to_string());
    for (image, cell) in controller.placements() {
        lines.push(format!(
            "    {} {} \u{2192} row {}, column {}",
            format_index(image.index + 1),
            file_name(&image.source),
            cell.row,
            cell.column
        ));
    }
    lines
}

pub fn print_layout(controller: &GalleryController) {
    for line in format_layout(controller) {
        println!("{}", line);
    }
}

/// One line describing the answer to a resize.
pub fn format_relayout(relayout: &Relayout) -> String {
    match relayout {
        Relayout::Changed(layout) => format!(
            "Relayout: {} columns, {} rows, canvas {}",
            layout.columns, layout.rows, layout.full_size
        ),
        Relayout::NoChange => "Relayout: no change".to_string(),
    }
}
