//! Grid layout math.
//!
//! All functions here are pure: no I/O, no state, no error path. Inputs that
//! would produce a degenerate grid are clamped instead (at least one column,
//! gaps never negative), and sizes saturate at `u32::MAX` rather than
//! overflow. When a viewport is narrower than one cell the grid
//! still gets one column and overflows horizontally. Absorbing that is the
//! scroll surface's job.
//!
//! The column formula comes from solving
//! `viewport = margins + n*item + (n-1)*spacing` for `n`: n columns need
//! only n-1 gaps, hence the `+ spacing` on the numerator.

use crate::config::ConfigError;
use crate::types::Size;
use serde::{Deserialize, Serialize};

/// Content margins around the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Margins {
    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn horizontal(&self) -> u32 {
        self.left.saturating_add(self.right)
    }

    pub fn vertical(&self) -> u32 {
        self.top.saturating_add(self.bottom)
    }
}

/// Grid cell coordinates of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub row: usize,
    pub column: usize,
}

/// Derived geometry of a laid-out grid. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutResult {
    pub columns: u32,
    pub rows: u32,
    /// Size the scroll surface must occupy to show the grid unclipped.
    pub full_size: Size,
    /// One cell plus margins; the viewport cannot usefully shrink below it.
    pub min_size: Size,
}

/// Number of columns that fit in `viewport_width`, never less than 1.
///
/// # Examples
/// ```
/// # use wallgrid::layout::compute_columns;
/// // (1000 - 100 + 30) / (240 + 30) = 930 / 270 → 3
/// assert_eq!(compute_columns(1000, 240, 30, 100), 3);
/// // Too narrow for a single cell still yields one column.
/// assert_eq!(compute_columns(0, 240, 30, 100), 1);
/// ```
pub fn compute_columns(
    viewport_width: u32,
    item_width: u32,
    spacing: u32,
    horizontal_margin: u32,
) -> u32 {
    let available = i64::from(viewport_width) - i64::from(horizontal_margin) + i64::from(spacing);
    let pitch = i64::from(item_width) + i64::from(spacing);
    if pitch == 0 {
        return 1;
    }
    let columns = available.div_euclid(pitch).max(1);
    u32::try_from(columns).unwrap_or(u32::MAX)
}

/// Rows needed for `item_count` items in `columns` columns.
pub fn compute_rows(item_count: usize, columns: u32) -> u32 {
    let columns = columns.max(1) as usize;
    let rows = item_count.div_ceil(columns);
    u32::try_from(rows).unwrap_or(u32::MAX)
}

/// Extent of `count` cells of `cell` pixels separated by `spacing`.
fn span(count: u32, cell: u32, spacing: u32) -> u32 {
    count
        .saturating_mul(cell)
        .saturating_add(count.saturating_sub(1).saturating_mul(spacing))
}

/// Total size of a `columns` x `rows` grid including margins.
///
/// With zero rows the height is the vertical margins alone.
pub fn compute_canvas_size(
    columns: u32,
    rows: u32,
    item_size: Size,
    spacing: u32,
    margins: Margins,
) -> Size {
    Size {
        width: margins
            .horizontal()
            .saturating_add(span(columns, item_size.width, spacing)),
        height: margins
            .vertical()
            .saturating_add(span(rows, item_size.height, spacing)),
    }
}

/// Size of a single-cell grid.
pub fn compute_minimum_size(item_size: Size, margins: Margins) -> Size {
    compute_canvas_size(1, 1, item_size, 0, margins)
}

/// Row-major cell for the item at `index`.
pub fn placement(index: usize, columns: u32) -> Placement {
    let columns = columns.max(1) as usize;
    Placement {
        row: index / columns,
        column: index % columns,
    }
}

/// Fixed grid geometry: cell size, spacing and margins.
///
/// Built once from configuration. Construction rejects a zero-sized cell,
/// which is the only input the formulas cannot absorb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    item: Size,
    spacing: u32,
    margins: Margins,
}

impl GridSpec {
    pub fn new(item: Size, spacing: u32, margins: Margins) -> Result<Self, ConfigError> {
        if item.width == 0 || item.height == 0 {
            return Err(ConfigError::Validation(format!(
                "thumbnail size must be positive, got {item}"
            )));
        }
        Ok(Self {
            item,
            spacing,
            margins,
        })
    }

    pub fn item(&self) -> Size {
        self.item
    }

    pub fn spacing(&self) -> u32 {
        self.spacing
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    pub fn columns_for(&self, viewport_width: u32) -> u32 {
        compute_columns(
            viewport_width,
            self.item.width,
            self.spacing,
            self.margins.horizontal(),
        )
    }

    pub fn canvas_size(&self, columns: u32, rows: u32) -> Size {
        compute_canvas_size(columns, rows, self.item, self.spacing, self.margins)
    }

    pub fn minimum_size(&self) -> Size {
        compute_minimum_size(self.item, self.margins)
    }

    /// Lay out `item_count` items in `columns` columns (clamped to ≥ 1).
    pub fn layout(&self, columns: u32, item_count: usize) -> LayoutResult {
        let columns = columns.max(1);
        let rows = compute_rows(item_count, columns);
        LayoutResult {
            columns,
            rows,
            full_size: self.canvas_size(columns, rows),
            min_size: self.minimum_size(),
        }
    }
}
