use std::{cell::Cell, rc::Rc};

use crate::{
    effect::handle::{Effect, Policy, Tick},
    foundation::{
        core::{Point, REFERENCE_FRAME_MS},
        error::MotionResult,
    },
};

/// Viewports narrower than this get no cursor glow.
pub const MIN_GLOW_VIEWPORT_WIDTH: f64 = 768.0;

/// Fraction of the remaining distance covered per reference frame.
const FOLLOW_PER_FRAME: f64 = 0.08;

/// Rendered glow.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct GlowState {
    /// Glow center, client pixels.
    pub position: Point,
    /// 1 while the pointer is over the document, else 0.
    pub opacity: f64,
}

/// Soft glow that trails the pointer.
pub struct CursorGlowEffect {
    pointer: Rc<Cell<Option<Point>>>,
    target: Point,
    glow: Rc<Cell<GlowState>>,
    last_elapsed: Option<f64>,
}

impl CursorGlowEffect {
    /// Glow following `pointer` (`None` while the pointer is outside the document).
    pub fn new(pointer: Rc<Cell<Option<Point>>>) -> Self {
        Self {
            pointer,
            target: Point::ORIGIN,
            glow: Rc::new(Cell::new(GlowState::default())),
            last_elapsed: None,
        }
    }

    /// Whether a viewport `width` pixels wide shows the glow at all. Touch devices
    /// never do.
    pub fn supported(width: f64, touch: bool) -> bool {
        Self::skip_reason(width, touch).is_none()
    }

    /// Why the glow is left out, or `None` when it is shown.
    pub fn skip_reason(width: f64, touch: bool) -> Option<String> {
        if touch {
            Some("skipped: touch device".to_string())
        } else if width < MIN_GLOW_VIEWPORT_WIDTH {
            Some(format!("skipped: viewport narrower than {MIN_GLOW_VIEWPORT_WIDTH} px"))
        } else {
            None
        }
    }

    /// Shared output cell.
    pub fn glow(&self) -> Rc<Cell<GlowState>> {
        Rc::clone(&self.glow)
    }

    /// Follow factor for a frame interval of `dt_ms`; 0.08 at exactly one 60 Hz frame.
    pub fn follow_factor(dt_ms: f64) -> f64 {
        1.0 - (1.0 - FOLLOW_PER_FRAME).powf(dt_ms.max(0.0) / REFERENCE_FRAME_MS)
    }
}

impl Effect for CursorGlowEffect {
    fn name(&self) -> &str {
        "cursor_glow"
    }

    fn policy(&self) -> Policy {
        Policy::Continuous
    }

    fn on_activate(&mut self) {
        self.last_elapsed = None;
    }

    fn tick(&mut self, elapsed_ms: f64) -> MotionResult<Tick> {
        let dt = match self.last_elapsed.replace(elapsed_ms) {
            Some(prev) => elapsed_ms - prev,
            None => REFERENCE_FRAME_MS,
        };
        let pointer = self.pointer.get();
        if let Some(p) = pointer {
            self.target = p;
        }
        let mut state = self.glow.get();
        let k = Self::follow_factor(dt);
        state.position = state.position.lerp(self.target, k);
        state.opacity = if pointer.is_some() { 1.0 } else { 0.0 };
        self.glow.set(state);
        Ok(Tick::Continue)
    }

    fn finish(&mut self) {
        self.glow.set(GlowState::default());
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({ "glow": self.glow.get() })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/cursor_glow.rs"]
mod tests;
