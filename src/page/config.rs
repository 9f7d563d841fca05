//! JSON description of a page to simulate headless.

use std::{collections::BTreeMap, path::Path};

use crate::{
    effects::counter::DEFAULT_COUNTER_DURATION_MS,
    foundation::{
        core::{AnchorId, BoxSpec, Point},
        error::{MotionError, MotionResult},
    },
    gate::options::{GateOptions, MarginLength, RootMargin, Tracking},
    theme::scheme::Theme,
};

/// Viewport dimensions in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewportSpec {
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
    /// Touch input; pointer-following effects are left out.
    #[serde(default)]
    pub touch: bool,
}

/// Partial gate options; unset fields fall back to the effect kind's defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GateOverride {
    /// Visibility threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Root margin in CSS shorthand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_margin: Option<RootMargin>,
    /// Entry-only or entry-and-exit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking: Option<Tracking>,
}

fn default_counter_duration() -> f64 {
    DEFAULT_COUNTER_DURATION_MS
}

/// Built-in effect kinds and their parameters.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectKind {
    /// Number counting up to `target`.
    Counter {
        /// Final value.
        target: i64,
        /// Counting time.
        #[serde(default = "default_counter_duration")]
        duration_ms: f64,
    },
    /// Element fading in.
    Reveal {
        /// Delay after entry before revealing.
        #[serde(default)]
        delay_ms: f64,
    },
    /// Drifting background blobs.
    Ambient {},
    /// Stacked layers tilting with scroll.
    Parallax {},
    /// Glow trailing the pointer.
    CursorGlow {},
    /// Card tilting toward the pointer while hovered.
    Tilt {},
    /// Button pulled toward the pointer while hovered.
    Magnetic {},
}

impl EffectKind {
    /// Gate options the page uses for this kind when nothing is overridden.
    pub fn default_gate(&self) -> GateOptions {
        match self {
            Self::Counter { .. } => GateOptions::once(0.5),
            Self::Reveal { .. } => GateOptions::once(0.1).with_root_margin(RootMargin {
                top: MarginLength::Px(0.0),
                right: MarginLength::Px(0.0),
                bottom: MarginLength::Px(-60.0),
                left: MarginLength::Px(0.0),
            }),
            Self::Ambient {}
            | Self::Parallax {}
            | Self::CursorGlow {}
            | Self::Tilt {}
            | Self::Magnetic {} => GateOptions::continuous(0.0),
        }
    }

    /// Snake-case kind label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Counter { .. } => "counter",
            Self::Reveal { .. } => "reveal",
            Self::Ambient {} => "ambient",
            Self::Parallax {} => "parallax",
            Self::CursorGlow {} => "cursor_glow",
            Self::Tilt {} => "tilt",
            Self::Magnetic {} => "magnetic",
        }
    }
}

/// One effect bound to an anchor.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EffectSpec {
    /// Element the effect is gated on.
    pub anchor: AnchorId,
    /// Kind and parameters.
    #[serde(flatten)]
    pub kind: EffectKind,
    /// Gate overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<GateOverride>,
}

impl EffectSpec {
    /// Kind defaults with any overrides applied.
    pub fn gate_options(&self) -> GateOptions {
        let mut options = self.kind.default_gate();
        if let Some(o) = self.gate {
            if let Some(t) = o.threshold {
                options.threshold = t;
            }
            if let Some(m) = o.root_margin {
                options.root_margin = m;
            }
            if let Some(t) = o.tracking {
                options.tracking = t;
            }
        }
        options
    }

    fn validate(&self, index: usize) -> MotionResult<()> {
        let ctx = |msg: String| {
            MotionError::config(format!(
                "effect #{index} ({} on '{}'): {msg}",
                self.kind.label(),
                self.anchor
            ))
        };
        let options = self.gate_options();
        if !(0.0..=1.0).contains(&options.threshold) {
            return Err(ctx(format!(
                "threshold {} must be within [0, 1]",
                options.threshold
            )));
        }
        match self.kind {
            EffectKind::Counter { duration_ms, .. }
                if !(duration_ms.is_finite() && duration_ms > 0.0) =>
            {
                Err(ctx(format!("duration_ms must be > 0, got {duration_ms}")))
            }
            EffectKind::Reveal { delay_ms } if !(delay_ms.is_finite() && delay_ms >= 0.0) => {
                Err(ctx(format!("delay_ms must be >= 0, got {delay_ms}")))
            }
            _ => Ok(()),
        }
    }
}

/// Scroll position change at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScrollEvent {
    /// Time of the change.
    pub at_ms: f64,
    /// New vertical scroll offset.
    pub y: f64,
}

/// Pointer move (or leave, when `x`/`y` are null) at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PointerEvent {
    /// Time of the change.
    pub at_ms: f64,
    /// Client x, or null when the pointer left.
    #[serde(default)]
    pub x: Option<f64>,
    /// Client y, or null when the pointer left.
    #[serde(default)]
    pub y: Option<f64>,
}

impl PointerEvent {
    /// Pointer position, `None` when it left the document.
    pub fn position(&self) -> Option<Point> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        }
    }
}

/// Page hidden or shown again (tab switch) at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VisibilityChange {
    /// Time of the change.
    pub at_ms: f64,
    /// Whether the page is now hidden.
    pub hidden: bool,
}

/// Headless page: layout, effects, and input timelines.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PageConfig {
    /// Viewport size.
    pub viewport: ViewportSpec,
    /// Force reduced motion.
    #[serde(default)]
    pub reduced_motion: bool,
    /// Initial theme when nothing is saved.
    #[serde(default)]
    pub theme: Theme,
    /// Document-space boxes by anchor id.
    #[serde(default)]
    pub anchors: BTreeMap<AnchorId, BoxSpec>,
    /// Effects to register, in order.
    #[serde(default)]
    pub effects: Vec<EffectSpec>,
    /// Sections tracked for the active-section indicator.
    #[serde(default)]
    pub sections: Vec<AnchorId>,
    /// Scroll timeline, sorted by time.
    #[serde(default)]
    pub scroll: Vec<ScrollEvent>,
    /// Pointer timeline, sorted by time.
    #[serde(default)]
    pub pointer: Vec<PointerEvent>,
    /// Page visibility timeline, sorted by time.
    #[serde(default)]
    pub visibility: Vec<VisibilityChange>,
}

impl PageConfig {
    /// Parse a page from JSON text and validate it.
    pub fn from_json_str(s: &str) -> MotionResult<Self> {
        let page: Self = serde_json::from_str(s)
            .map_err(|e| MotionError::config(format!("parse page JSON: {e}")))?;
        page.validate()?;
        Ok(page)
    }

    /// Read, parse and validate a page file.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> MotionResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| MotionError::config(format!("read '{}': {e}", path.display())))?;
        let page = Self::from_json_str(&text)?;
        tracing::debug!(
            effects = page.effects.len(),
            anchors = page.anchors.len(),
            "page loaded"
        );
        Ok(page)
    }

    /// Structural checks. Anchors referenced but not laid out are left to registration,
    /// which rejects them one effect at a time.
    pub fn validate(&self) -> MotionResult<()> {
        let ViewportSpec { width, height, .. } = self.viewport;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(MotionError::config(format!(
                "viewport must be positive, got {width}x{height}"
            )));
        }
        for (anchor, b) in &self.anchors {
            let finite = [b.x, b.y, b.width, b.height].iter().all(|v| v.is_finite());
            if !finite || b.width < 0.0 || b.height < 0.0 {
                return Err(MotionError::config(format!(
                    "anchor '{anchor}' has an invalid box"
                )));
            }
        }
        for (i, effect) in self.effects.iter().enumerate() {
            effect.validate(i)?;
        }
        check_timeline("scroll", self.scroll.iter().map(|e| e.at_ms))?;
        check_timeline("pointer", self.pointer.iter().map(|e| e.at_ms))?;
        check_timeline("visibility", self.visibility.iter().map(|e| e.at_ms))?;
        for e in &self.pointer {
            if e.x.is_some() != e.y.is_some() {
                return Err(MotionError::config(format!(
                    "pointer event at {} ms needs both x and y, or neither",
                    e.at_ms
                )));
            }
        }
        Ok(())
    }
}

fn check_timeline(name: &str, times: impl Iterator<Item = f64>) -> MotionResult<()> {
    let mut prev = f64::NEG_INFINITY;
    for t in times {
        if !t.is_finite() || t < 0.0 {
            return Err(MotionError::config(format!(
                "{name} timeline has invalid time {t}"
            )));
        }
        if t < prev {
            return Err(MotionError::config(format!(
                "{name} timeline is not sorted ({t} after {prev})"
            )));
        }
        prev = t;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/page/config.rs"]
mod tests;
