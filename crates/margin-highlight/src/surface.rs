//! Rendering surface capability
//!
//! The engine never draws. It tells the surface which page to show and
//! when to drop annotations belonging to a replaced document.

use serde::{Deserialize, Serialize};

/// Rectangle on a page, in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// 1-based page number
    pub page: u32,
    /// Left edge
    pub x0: f64,
    /// Top edge
    pub y0: f64,
    /// Right edge
    pub x1: f64,
    /// Bottom edge
    pub y1: f64,
}

impl BoundingBox {
    /// Create bounding box
    #[inline]
    #[must_use]
    pub fn new(page: u32, x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { page, x0, y0, x1, y1 }
    }
}

/// Display target driven by the orchestrator
///
/// Calls arrive in publish order, after the new snapshot is visible.
/// Implementations may read the orchestrator's snapshot but must not load
/// documents or request highlights from inside a callback.
pub trait RenderSurface: Send + Sync {
    /// Navigate to `page`
    fn show_page(&self, page: u32);

    /// Attach an annotation covering `boxes`
    fn attach_annotation(&self, boxes: &[BoundingBox], content: &str);

    /// Remove every annotation
    fn clear_annotations(&self);
}

/// Surface that ignores every call
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSurface;

impl RenderSurface for NullSurface {
    fn show_page(&self, _page: u32) {}

    fn attach_annotation(&self, _boxes: &[BoundingBox], _content: &str) {}

    fn clear_annotations(&self) {}
}
