use std::{cell::Cell, fmt, rc::Rc};

use crate::{
    effect::handle::{Effect, Policy, Tick},
    foundation::{
        core::AnchorId,
        error::{MotionError, MotionResult},
    },
    gate::geometry::LayoutSource,
};

/// 3D transform of one stacked layer, printed as a CSS transform list.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct LayerTransform {
    /// Rotation about the Y axis, degrees.
    pub rotate_y_deg: f64,
    /// Rotation about the X axis, degrees.
    pub rotate_x_deg: f64,
    /// Depth offset, pixels.
    pub translate_z_px: f64,
    /// Vertical offset, pixels.
    pub translate_y_px: f64,
}

impl fmt::Display for LayerTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rotateY({}deg) rotateX({}deg) translateZ({}px) translateY({}px)",
            self.rotate_y_deg, self.rotate_x_deg, self.translate_z_px, self.translate_y_px
        )
    }
}

/// Transforms of the three stacked layers at one scroll position.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ParallaxLayers {
    /// Scroll progress through the viewport in `[0, 1]`.
    pub progress: f64,
    /// Front layer.
    pub front: LayerTransform,
    /// Middle layer.
    pub mid: LayerTransform,
    /// Back layer.
    pub back: LayerTransform,
    /// Back layer opacity.
    pub back_opacity: f64,
}

impl ParallaxLayers {
    /// Layers at progress `p` (clamped).
    pub fn at(p: f64) -> Self {
        let p = p.clamp(0.0, 1.0);
        Self {
            progress: p,
            front: LayerTransform {
                rotate_y_deg: 2.0 - p * 4.0,
                translate_y_px: p * -8.0,
                ..LayerTransform::default()
            },
            mid: LayerTransform {
                rotate_y_deg: 5.0 - p * 6.0,
                rotate_x_deg: 1.0 - p,
                translate_z_px: -30.0 + p * 15.0,
                translate_y_px: p * -12.0,
            },
            back: LayerTransform {
                rotate_y_deg: 8.0 - p * 8.0,
                rotate_x_deg: 2.0 - p * 2.0,
                translate_z_px: -60.0 + p * 20.0,
                translate_y_px: p * -16.0,
            },
            back_opacity: 0.5 + p * 0.3,
        }
    }
}

/// Scroll progress of a box with client-space `top`/`height` in a viewport `view_h`
/// tall: 0 while it sits below the fold, 1 once it has left through the top.
pub fn scroll_progress(top: f64, height: f64, view_h: f64) -> f64 {
    let span = view_h + height;
    if span <= 0.0 {
        return 0.0;
    }
    (1.0 - (top + height) / span).clamp(0.0, 1.0)
}

/// Tilts three stacked layers as their anchor scrolls through the viewport.
///
/// `None` in the output cell means the layers are at rest (no transform applied).
pub struct ParallaxEffect {
    layout: Rc<dyn LayoutSource>,
    anchor: AnchorId,
    layers: Rc<Cell<Option<ParallaxLayers>>>,
}

impl ParallaxEffect {
    /// Parallax reading `anchor`'s client rect from `layout` on every tick.
    pub fn new(layout: Rc<dyn LayoutSource>, anchor: AnchorId) -> Self {
        Self {
            layout,
            anchor,
            layers: Rc::new(Cell::new(None)),
        }
    }

    /// Shared output cell.
    pub fn layers(&self) -> Rc<Cell<Option<ParallaxLayers>>> {
        Rc::clone(&self.layers)
    }
}

impl Effect for ParallaxEffect {
    fn name(&self) -> &str {
        "parallax"
    }

    fn policy(&self) -> Policy {
        Policy::Continuous
    }

    fn tick(&mut self, _elapsed_ms: f64) -> MotionResult<Tick> {
        let rect = self.layout.client_rect(&self.anchor).ok_or_else(|| {
            MotionError::tick(format!("parallax anchor '{}' is no longer laid out", self.anchor))
        })?;
        let view_h = self.layout.viewport_size().height;
        let p = scroll_progress(rect.y0, rect.height(), view_h);
        self.layers.set(Some(ParallaxLayers::at(p)));
        Ok(Tick::Continue)
    }

    fn finish(&mut self) {
        self.layers.set(None);
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({ "layers": self.layers.get() })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/parallax.rs"]
mod tests;
