use std::{cell::Cell, fmt, rc::Rc};

use crate::{
    effect::handle::{Effect, Policy, Tick},
    foundation::{
        core::{AnchorId, Point, Rect},
        error::{MotionError, MotionResult},
    },
    gate::geometry::LayoutSource,
};

/// Card lift and tilt toward the pointer.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct CardTilt {
    /// Rotation about the X axis, degrees; pointer near the top tilts the card back.
    pub rotate_x_deg: f64,
    /// Rotation about the Y axis, degrees.
    pub rotate_y_deg: f64,
}

impl CardTilt {
    /// Maximum tilt in degrees at the card's edges (pointer offset ±0.5).
    pub const MAX_DEG: f64 = 1.5;

    /// Tilt for `pointer` over a card at client rect `card`; `None` when the pointer is
    /// outside the card.
    pub fn at(pointer: Point, card: Rect) -> Option<Self> {
        if !hovers(pointer, card) {
            return None;
        }
        let x = (pointer.x - card.x0) / card.width() - 0.5;
        let y = (pointer.y - card.y0) / card.height() - 0.5;
        Some(Self {
            rotate_x_deg: y * -3.0,
            rotate_y_deg: x * 3.0,
        })
    }
}

impl fmt::Display for CardTilt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translateY(-4px) perspective(600px) rotateX({}deg) rotateY({}deg)",
            self.rotate_x_deg, self.rotate_y_deg
        )
    }
}

/// Button growing slightly and leaning toward the pointer.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct MagneticPull {
    /// Horizontal offset, pixels.
    pub dx: f64,
    /// Vertical offset, pixels.
    pub dy: f64,
}

impl MagneticPull {
    /// Scale applied while hovered.
    pub const SCALE: f64 = 1.05;
    /// Share of the pointer's distance from the button center that the button follows.
    pub const STRENGTH: f64 = 0.15;

    /// Pull for `pointer` over a button at client rect `button`; `None` when the
    /// pointer is outside the button.
    pub fn at(pointer: Point, button: Rect) -> Option<Self> {
        if !hovers(pointer, button) {
            return None;
        }
        let offset = pointer - button.center();
        Some(Self {
            dx: offset.x * Self::STRENGTH,
            dy: offset.y * Self::STRENGTH,
        })
    }
}

impl fmt::Display for MagneticPull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scale({}) translate({}px, {}px)",
            Self::SCALE,
            self.dx,
            self.dy
        )
    }
}

fn hovers(pointer: Point, rect: Rect) -> bool {
    rect.width() > 0.0 && rect.height() > 0.0 && rect.contains(pointer)
}

/// Which hover interaction a [`HoverEffect`] renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoverKind {
    /// [`CardTilt`].
    Tilt,
    /// [`MagneticPull`].
    Magnetic,
}

/// Transform written while the pointer is over the anchor.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HoverTransform {
    /// Card tilt.
    Tilt(CardTilt),
    /// Magnetic button.
    Magnetic(MagneticPull),
}

impl HoverTransform {
    /// Transform of `kind` for `pointer` over `rect`.
    pub fn at(kind: HoverKind, pointer: Point, rect: Rect) -> Option<Self> {
        match kind {
            HoverKind::Tilt => CardTilt::at(pointer, rect).map(Self::Tilt),
            HoverKind::Magnetic => MagneticPull::at(pointer, rect).map(Self::Magnetic),
        }
    }
}

impl fmt::Display for HoverTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tilt(t) => t.fmt(f),
            Self::Magnetic(m) => m.fmt(f),
        }
    }
}

/// Pointer-driven micro-interaction on one anchor.
///
/// Ticks while the anchor is visible; the output is `None` (no transform) whenever
/// the pointer is elsewhere, once deactivated, and under reduced motion.
pub struct HoverEffect {
    kind: HoverKind,
    layout: Rc<dyn LayoutSource>,
    anchor: AnchorId,
    pointer: Rc<Cell<Option<Point>>>,
    transform: Rc<Cell<Option<HoverTransform>>>,
}

impl HoverEffect {
    /// Hover effect on `anchor`, reading its client rect from `layout` and the pointer
    /// from `pointer`.
    pub fn new(
        kind: HoverKind,
        layout: Rc<dyn LayoutSource>,
        anchor: AnchorId,
        pointer: Rc<Cell<Option<Point>>>,
    ) -> Self {
        Self {
            kind,
            layout,
            anchor,
            pointer,
            transform: Rc::new(Cell::new(None)),
        }
    }

    /// Shared output cell.
    pub fn transform(&self) -> Rc<Cell<Option<HoverTransform>>> {
        Rc::clone(&self.transform)
    }
}

impl Effect for HoverEffect {
    fn name(&self) -> &str {
        match self.kind {
            HoverKind::Tilt => "tilt",
            HoverKind::Magnetic => "magnetic",
        }
    }

    fn policy(&self) -> Policy {
        Policy::Continuous
    }

    fn on_deactivate(&mut self) {
        self.transform.set(None);
    }

    fn tick(&mut self, _elapsed_ms: f64) -> MotionResult<Tick> {
        let rect = self.layout.client_rect(&self.anchor).ok_or_else(|| {
            MotionError::tick(format!("hover anchor '{}' is no longer laid out", self.anchor))
        })?;
        let transform = self
            .pointer
            .get()
            .and_then(|p| HoverTransform::at(self.kind, p, rect));
        self.transform.set(transform);
        Ok(Tick::Continue)
    }

    fn finish(&mut self) {
        self.transform.set(None);
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "transform": self.transform.get().map(|t| t.to_string()),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/hover.rs"]
mod tests;
