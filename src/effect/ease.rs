/// Easing curves for one-shot effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    /// Identity.
    Linear,
    /// Quadratic deceleration.
    OutQuad,
    /// Cubic deceleration; the counter default.
    OutCubic,
    /// Cubic acceleration then deceleration.
    InOutCubic,
}

impl Ease {
    /// Map linear progress `t` to eased progress. Input is clamped to `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
        }
    }

    /// Linear progress of `elapsed_ms` through `duration_ms`, clamped to `[0, 1]`.
    /// A non-positive duration is already complete.
    pub fn progress(elapsed_ms: f64, duration_ms: f64) -> f64 {
        if duration_ms <= 0.0 {
            return 1.0;
        }
        (elapsed_ms / duration_ms).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effect/ease.rs"]
mod tests;
