//! Headless intersection source computed from rectangles.

use std::{cell::RefCell, collections::BTreeMap};

use super::{
    options::GateOptions,
    visibility::{IntersectionSample, ObservationHandle, ObserverBackend, VisibilityGate},
};
use crate::foundation::{
    core::{AnchorId, Point, Rect, Size},
    error::{MotionError, MotionResult},
};

/// Document-space boxes of every known anchor.
#[derive(Clone, Debug, Default)]
pub struct AnchorLayout {
    boxes: BTreeMap<AnchorId, Rect>,
}

impl AnchorLayout {
    /// Empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place or move an anchor.
    pub fn place(&mut self, anchor: AnchorId, rect: Rect) {
        self.boxes.insert(anchor, rect);
    }

    /// Remove an anchor, as when its element leaves the document.
    pub fn remove(&mut self, anchor: &AnchorId) -> Option<Rect> {
        self.boxes.remove(anchor)
    }

    /// Document-space box of `anchor`.
    pub fn get(&self, anchor: &AnchorId) -> Option<Rect> {
        self.boxes.get(anchor).copied()
    }

    /// Whether `anchor` is placed.
    pub fn contains(&self, anchor: &AnchorId) -> bool {
        self.boxes.contains_key(anchor)
    }
}

/// Visible window onto the document.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Scroll offset (top-left corner in document space).
    pub scroll: Point,
    /// Visible size.
    pub size: Size,
}

impl Viewport {
    /// Viewport of `size` scrolled to the top.
    pub fn new(size: Size) -> Self {
        Self {
            scroll: Point::ORIGIN,
            size,
        }
    }

    /// Visible region in document space.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.scroll, self.size)
    }

    /// Map a document-space box to viewport-relative coordinates.
    pub fn to_client(&self, rect: Rect) -> Rect {
        rect - self.scroll.to_vec2()
    }
}

/// Intersection of `target` with `root`, in the same terms a browser observer reports.
///
/// Edge-adjacent boxes count as intersecting with ratio zero; a zero-area target that
/// intersects reports ratio one.
pub fn intersection(target: Rect, root: Rect) -> (bool, f64) {
    let x0 = target.x0.max(root.x0);
    let y0 = target.y0.max(root.y0);
    let x1 = target.x1.min(root.x1);
    let y1 = target.y1.min(root.y1);
    if x0 > x1 || y0 > y1 {
        return (false, 0.0);
    }
    let area = target.area();
    if area <= 0.0 {
        return (true, 1.0);
    }
    let visible = (x1 - x0) * (y1 - y0);
    (true, (visible / area).clamp(0.0, 1.0))
}

/// Read-only geometry queries effects may make while ticking.
pub trait LayoutSource {
    /// Viewport-relative box of `anchor`.
    fn client_rect(&self, anchor: &AnchorId) -> Option<Rect>;
    /// Current viewport size.
    fn viewport_size(&self) -> Size;
}

struct GeometryState {
    layout: AnchorLayout,
    viewport: Viewport,
    watched: BTreeMap<ObservationHandle, (AnchorId, GateOptions)>,
}

/// [`ObserverBackend`] that derives samples from an [`AnchorLayout`] and a scrolling
/// [`Viewport`]. Call [`GeometryObserver::refresh`] after scrolling or layout changes.
pub struct GeometryObserver {
    state: RefCell<GeometryState>,
}

impl GeometryObserver {
    /// Observer over `layout` seen through `viewport`.
    pub fn new(layout: AnchorLayout, viewport: Viewport) -> Self {
        Self {
            state: RefCell::new(GeometryState {
                layout,
                viewport,
                watched: BTreeMap::new(),
            }),
        }
    }

    /// Scroll to `y` (document space), keeping the horizontal offset.
    pub fn scroll_to(&self, y: f64) {
        self.state.borrow_mut().viewport.scroll.y = y.max(0.0);
    }

    /// Resize the viewport.
    pub fn resize(&self, size: Size) {
        self.state.borrow_mut().viewport.size = size;
    }

    /// Place or move an anchor.
    pub fn place(&self, anchor: AnchorId, rect: Rect) {
        self.state.borrow_mut().layout.place(anchor, rect);
    }

    /// Current viewport.
    pub fn viewport(&self) -> Viewport {
        self.state.borrow().viewport
    }

    /// Whether `anchor` exists in the layout.
    pub fn has_anchor(&self, anchor: &AnchorId) -> bool {
        self.state.borrow().layout.contains(anchor)
    }

    /// Number of observations currently watched.
    pub fn watched_count(&self) -> usize {
        self.state.borrow().watched.len()
    }

    /// Measure every watched anchor and deliver the samples to `gate`.
    ///
    /// Anchors removed from the layout report as not intersecting.
    pub fn refresh(&self, gate: &VisibilityGate) {
        let samples: Vec<IntersectionSample> = {
            let state = self.state.borrow();
            let root = state.viewport.rect();
            state
                .watched
                .iter()
                .map(|(handle, (anchor, options))| {
                    let (intersecting, ratio) = match state.layout.get(anchor) {
                        Some(rect) => intersection(rect, options.root_margin.expand(root)),
                        None => (false, 0.0),
                    };
                    IntersectionSample {
                        handle: *handle,
                        ratio,
                        intersecting,
                    }
                })
                .collect()
        };
        gate.deliver(samples);
    }
}

impl ObserverBackend for GeometryObserver {
    fn watch(
        &self,
        _gate: &VisibilityGate,
        handle: ObservationHandle,
        anchor: &AnchorId,
        options: &GateOptions,
    ) -> MotionResult<()> {
        let mut state = self.state.borrow_mut();
        if !state.layout.contains(anchor) {
            return Err(MotionError::registration(format!(
                "anchor '{anchor}' is not in the layout"
            )));
        }
        state.watched.insert(handle, (anchor.clone(), *options));
        Ok(())
    }

    fn unwatch(&self, handle: ObservationHandle) {
        self.state.borrow_mut().watched.remove(&handle);
    }
}

impl LayoutSource for GeometryObserver {
    fn client_rect(&self, anchor: &AnchorId) -> Option<Rect> {
        let state = self.state.borrow();
        state.layout.get(anchor).map(|r| state.viewport.to_client(r))
    }

    fn viewport_size(&self) -> Size {
        self.state.borrow().viewport.size
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gate/geometry.rs"]
mod tests;
