//! Construction of the built-in effects from their [`EffectSpec`]s, shared by the
//! headless simulation and the browser runtime.

use std::{cell::Cell, rc::Rc};

use crate::{
    effect::handle::Effect,
    effects::{
        ambient::AmbientEffect,
        counter::CounterEffect,
        cursor_glow::CursorGlowEffect,
        hover::{HoverEffect, HoverKind},
        parallax::ParallaxEffect,
        reveal::RevealEffect,
    },
    foundation::{core::Point, error::MotionResult},
    gate::geometry::LayoutSource,
    page::config::{EffectKind, EffectSpec},
    theme::scheme::Theme,
};

/// Live page inputs the built-in effects read while ticking.
#[derive(Clone)]
pub struct EffectInputs {
    /// Client rects and viewport size.
    pub layout: Rc<dyn LayoutSource>,
    /// Current theme.
    pub theme: Rc<Cell<Theme>>,
    /// Pointer position, `None` while it is outside the document.
    pub pointer: Rc<Cell<Option<Point>>>,
    /// Viewport width at build time.
    pub viewport_width: f64,
    /// Whether the device has touch input.
    pub touch: bool,
}

/// Outcome of [`EffectSpec::build`].
pub enum Assembled {
    /// Ready to register.
    Ready(Box<dyn Effect>),
    /// Left out on this device, with the reason.
    Skipped(String),
}

impl EffectSpec {
    /// Build the described effect. Invalid parameters are `Config` errors.
    pub fn build(&self, inputs: &EffectInputs) -> MotionResult<Assembled> {
        let effect: Box<dyn Effect> = match self.kind {
            EffectKind::Counter {
                target,
                duration_ms,
            } => Box::new(CounterEffect::new(target, duration_ms)?),
            EffectKind::Reveal { delay_ms } => Box::new(RevealEffect::new(delay_ms)?),
            EffectKind::Ambient {} => Box::new(AmbientEffect::new(
                Rc::clone(&inputs.layout),
                Rc::clone(&inputs.theme),
            )),
            EffectKind::Parallax {} => Box::new(ParallaxEffect::new(
                Rc::clone(&inputs.layout),
                self.anchor.clone(),
            )),
            EffectKind::CursorGlow {} => {
                if let Some(reason) =
                    CursorGlowEffect::skip_reason(inputs.viewport_width, inputs.touch)
                {
                    return Ok(Assembled::Skipped(reason));
                }
                Box::new(CursorGlowEffect::new(Rc::clone(&inputs.pointer)))
            }
            EffectKind::Tilt {} => self.hover(HoverKind::Tilt, inputs),
            EffectKind::Magnetic {} => self.hover(HoverKind::Magnetic, inputs),
        };
        Ok(Assembled::Ready(effect))
    }

    fn hover(&self, kind: HoverKind, inputs: &EffectInputs) -> Box<dyn Effect> {
        Box::new(HoverEffect::new(
            kind,
            Rc::clone(&inputs.layout),
            self.anchor.clone(),
            Rc::clone(&inputs.pointer),
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/page/build.rs"]
mod tests;
