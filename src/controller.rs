//! Gallery controller: refresh once, lay out on every resize.
//!
//! The controller owns the refreshed image list and the current column
//! count. It never touches the cache again after initialization; a resize
//! only reruns the layout math, and only reports a new layout when the
//! column count actually moved.

use crate::cache::{CacheError, RefreshOutcome, ThumbnailCache};
use crate::imaging::DecodeError;
use crate::layout::{GridSpec, LayoutResult, Placement, placement};
use crate::types::{GalleryImage, Size, SourceImage};
use tracing::debug;

/// Answer to a viewport change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relayout {
    /// The column count changed; the presentation must re-place every item.
    Changed(LayoutResult),
    /// Same column count as before. Nothing to do.
    NoChange,
}

pub struct GalleryController {
    spec: GridSpec,
    images: Vec<GalleryImage>,
    skipped: Vec<DecodeError>,
    columns: u32,
}

impl GalleryController {
    /// Refresh `cache` against `sources` and lay the result out in
    /// `columns_hint` columns.
    pub fn initialize(
        cache: &mut ThumbnailCache,
        sources: &[SourceImage],
        spec: GridSpec,
        columns_hint: u32,
    ) -> Result<(Self, LayoutResult), CacheError> {
        let RefreshOutcome {
            images, skipped, ..
        } = cache.refresh(sources)?;
        Ok(Self::from_images(images, skipped, spec, columns_hint))
    }

    /// Build from a refresh that already ran, e.g. on a
    /// [`RefreshWorker`](crate::worker::RefreshWorker).
    pub fn from_images(
        images: Vec<GalleryImage>,
        skipped: Vec<DecodeError>,
        spec: GridSpec,
        columns_hint: u32,
    ) -> (Self, LayoutResult) {
        let controller = Self {
            spec,
            images,
            skipped,
            columns: columns_hint.max(1),
        };
        let layout = controller.layout();
        (controller, layout)
    }

    /// React to a new viewport size.
    pub fn on_resize(&mut self, viewport: Size) -> Relayout {
        let columns = self.spec.columns_for(viewport.width);
        if columns == self.columns {
            return Relayout::NoChange;
        }
        debug!(from = self.columns, to = columns, viewport = %viewport, "relayout");
        self.columns = columns;
        Relayout::Changed(self.layout())
    }

    /// Layout for the current column count.
    pub fn layout(&self) -> LayoutResult {
        self.spec.layout(self.columns, self.images.len())
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn images(&self) -> &[GalleryImage] {
        &self.images
    }

    /// Sources that were left out because they could not be decoded.
    pub fn skipped(&self) -> &[DecodeError] {
        &self.skipped
    }

    pub fn placement_of(&self, index: usize) -> Option<Placement> {
        (index < self.images.len()).then(|| placement(index, self.columns))
    }

    /// Every image with its grid cell, in gallery order.
    pub fn placements(&self) -> impl Iterator<Item = (&GalleryImage, Placement)> {
        let columns = self.columns;
        self.images
            .iter()
            .map(move |image| (image, placement(image.index, columns)))
    }

    /// The window size that shows `rows_hint` full rows at the current
    /// column count.
    pub fn preferred_size(&self, rows_hint: u32) -> Size {
        self.spec.canvas_size(self.columns, rows_hint.max(1))
    }

    pub fn minimum_size(&self) -> Size {
        self.spec.minimum_size()
    }
}
