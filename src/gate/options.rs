use std::{fmt, str::FromStr};

use crate::foundation::{
    core::Rect,
    error::{MotionError, MotionResult},
};

/// One side of a root margin, in pixels or percent of the root's matching axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MarginLength {
    /// Absolute offset in CSS pixels.
    Px(f64),
    /// Percent of the root width (left/right) or height (top/bottom).
    Percent(f64),
}

impl MarginLength {
    fn resolve(self, axis_len: f64) -> f64 {
        match self {
            Self::Px(v) => v,
            Self::Percent(p) => axis_len * p / 100.0,
        }
    }
}

impl FromStr for MarginLength {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (num, pct) = if let Some(n) = s.strip_suffix('%') {
            (n, true)
        } else if let Some(n) = s.strip_suffix("px") {
            (n, false)
        } else if s == "0" {
            (s, false)
        } else {
            return Err(MotionError::config(format!(
                "root margin '{s}' must be in px or %"
            )));
        };
        let v: f64 = num
            .trim()
            .parse()
            .map_err(|_| MotionError::config(format!("root margin '{s}' is not a number")))?;
        if !v.is_finite() {
            return Err(MotionError::config(format!("root margin '{s}' is not finite")));
        }
        Ok(if pct { Self::Percent(v) } else { Self::Px(v) })
    }
}

impl fmt::Display for MarginLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{v}px"),
            Self::Percent(v) => write!(f, "{v}%"),
        }
    }
}

/// Grow (positive) or shrink (negative) the root box before intersecting, using the
/// CSS `margin` shorthand order: top, right, bottom, left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootMargin {
    /// Top edge offset.
    pub top: MarginLength,
    /// Right edge offset.
    pub right: MarginLength,
    /// Bottom edge offset.
    pub bottom: MarginLength,
    /// Left edge offset.
    pub left: MarginLength,
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::uniform(MarginLength::Px(0.0))
    }
}

impl RootMargin {
    /// Same offset on every side.
    pub fn uniform(v: MarginLength) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    /// Apply the margin to `root`.
    pub fn expand(&self, root: Rect) -> Rect {
        let w = root.width();
        let h = root.height();
        Rect::new(
            root.x0 - self.left.resolve(w),
            root.y0 - self.top.resolve(h),
            root.x1 + self.right.resolve(w),
            root.y1 + self.bottom.resolve(h),
        )
    }
}

impl FromStr for RootMargin {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split_whitespace()
            .map(str::parse::<MarginLength>)
            .collect::<MotionResult<Vec<_>>>()?;
        match parts.as_slice() {
            [a] => Ok(Self::uniform(*a)),
            [v, h] => Ok(Self {
                top: *v,
                right: *h,
                bottom: *v,
                left: *h,
            }),
            [t, h, b] => Ok(Self {
                top: *t,
                right: *h,
                bottom: *b,
                left: *h,
            }),
            [t, r, b, l] => Ok(Self {
                top: *t,
                right: *r,
                bottom: *b,
                left: *l,
            }),
            _ => Err(MotionError::config(format!(
                "root margin '{s}' needs 1 to 4 values"
            ))),
        }
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

impl serde::Serialize for RootMargin {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for RootMargin {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Whether an observation keeps reporting after the first entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tracking {
    /// Report the first entry only; the caller unobserves afterwards.
    Once,
    /// Report every entry and exit.
    Continuous,
}

/// Observation parameters for one anchor.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GateOptions {
    /// Visible fraction of the anchor at or above which it counts as visible.
    /// `0.0` means "any intersection at all".
    #[serde(default)]
    pub threshold: f64,
    /// Adjustment applied to the viewport before intersecting.
    #[serde(default)]
    pub root_margin: RootMargin,
    /// Entry-only or entry-and-exit reporting.
    #[serde(default = "default_tracking")]
    pub tracking: Tracking,
}

fn default_tracking() -> Tracking {
    Tracking::Once
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            root_margin: RootMargin::default(),
            tracking: Tracking::Once,
        }
    }
}

impl GateOptions {
    /// Entry-only observation at `threshold`.
    pub fn once(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// Entry-and-exit observation at `threshold`.
    pub fn continuous(threshold: f64) -> Self {
        Self {
            threshold,
            tracking: Tracking::Continuous,
            ..Self::default()
        }
    }

    /// Replace the root margin.
    pub fn with_root_margin(mut self, margin: RootMargin) -> Self {
        self.root_margin = margin;
        self
    }

    /// Reject thresholds outside `[0, 1]`.
    pub fn validate(&self) -> MotionResult<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(MotionError::config(format!(
                "threshold {} must be within [0, 1]",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Whether a sample with `ratio` and `intersecting` counts as visible.
    pub fn passes(&self, ratio: f64, intersecting: bool) -> bool {
        if !intersecting {
            return false;
        }
        self.threshold <= 0.0 || ratio >= self.threshold
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gate/options.rs"]
mod tests;
