use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::{
    effect::handle::{Effect, Policy, Tick},
    foundation::{
        core::{Point, REFERENCE_FRAME_MS},
        error::MotionResult,
    },
    gate::geometry::LayoutSource,
    theme::scheme::{Rgba, Theme},
};

#[derive(Clone, Copy, Debug)]
struct Blob {
    x: f64,
    y: f64,
    radius: f64,
    speed: f64,
    phase: f64,
}

const BLOBS: [Blob; 4] = [
    Blob {
        x: 0.2,
        y: 0.3,
        radius: 0.15,
        speed: 0.0003,
        phase: 0.0,
    },
    Blob {
        x: 0.7,
        y: 0.6,
        radius: 0.2,
        speed: 0.0002,
        phase: 2.0,
    },
    Blob {
        x: 0.5,
        y: 0.2,
        radius: 0.12,
        speed: 0.00035,
        phase: 4.0,
    },
    Blob {
        x: 0.8,
        y: 0.8,
        radius: 0.18,
        speed: 0.00025,
        phase: 1.0,
    },
];

/// One radial blob as drawn in a frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct BlobFrame {
    /// Center in viewport pixels.
    pub center: Point,
    /// Radius in viewport pixels.
    pub radius: f64,
    /// Inner gradient stop; the outer stop is transparent.
    pub color: Rgba,
}

/// Slowly drifting background blobs.
///
/// Time is counted in reference frames and carried across deactivations, so the
/// blobs resume where they paused.
pub struct AmbientEffect {
    layout: Rc<dyn LayoutSource>,
    theme: Rc<Cell<Theme>>,
    frames: Rc<RefCell<Vec<BlobFrame>>>,
    carried: f64,
    last_elapsed: f64,
}

impl AmbientEffect {
    /// Ambient background sized from `layout`'s viewport and tinted by `theme`.
    pub fn new(layout: Rc<dyn LayoutSource>, theme: Rc<Cell<Theme>>) -> Self {
        Self {
            layout,
            theme,
            frames: Rc::new(RefCell::new(Vec::new())),
            carried: 0.0,
            last_elapsed: 0.0,
        }
    }

    /// Shared list of blobs drawn in the latest frame. Empty when nothing is drawn.
    pub fn frames(&self) -> Rc<RefCell<Vec<BlobFrame>>> {
        Rc::clone(&self.frames)
    }

    /// Reference frames counted so far.
    pub fn time(&self) -> f64 {
        self.carried + self.last_elapsed / REFERENCE_FRAME_MS
    }

    fn draw(&self, time: f64) -> Vec<BlobFrame> {
        let size = self.layout.viewport_size();
        let palette = self.theme.get().blob_palette();
        BLOBS
            .iter()
            .zip(palette)
            .map(|(blob, color)| BlobFrame {
                center: Point::new(
                    size.width * (blob.x + (time * blob.speed + blob.phase).sin() * 0.08),
                    size.height * (blob.y + (time * blob.speed * 0.7 + blob.phase).cos() * 0.06),
                ),
                radius: size.width.min(size.height) * blob.radius,
                color,
            })
            .collect()
    }
}

impl Effect for AmbientEffect {
    fn name(&self) -> &str {
        "ambient"
    }

    fn policy(&self) -> Policy {
        Policy::Continuous
    }

    fn on_activate(&mut self) {
        self.last_elapsed = 0.0;
    }

    fn on_deactivate(&mut self) {
        self.carried += self.last_elapsed / REFERENCE_FRAME_MS;
        self.last_elapsed = 0.0;
    }

    fn tick(&mut self, elapsed_ms: f64) -> MotionResult<Tick> {
        self.last_elapsed = elapsed_ms;
        let frame = self.draw(self.time());
        *self.frames.borrow_mut() = frame;
        Ok(Tick::Continue)
    }

    fn finish(&mut self) {
        self.frames.borrow_mut().clear();
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "time": self.time(),
            "blobs": &*self.frames.borrow(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/ambient.rs"]
mod tests;
