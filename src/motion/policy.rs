use crate::foundation::error::MotionResult;

/// Environment variable that forces reduced motion for headless runs.
pub const REDUCED_MOTION_ENV: &str = "MOTION_GATE_REDUCED_MOTION";

/// Platform signal for the user's reduced-motion preference.
pub trait MotionPreferenceSource {
    /// Whether the user asked for reduced motion.
    fn prefers_reduced_motion(&self) -> MotionResult<bool>;
}

/// Fixed preference value.
#[derive(Clone, Copy, Debug)]
pub struct StaticPreference(pub bool);

impl MotionPreferenceSource for StaticPreference {
    fn prefers_reduced_motion(&self) -> MotionResult<bool> {
        Ok(self.0)
    }
}

/// Reads [`REDUCED_MOTION_ENV`]; `1`, `true`, `yes` and `reduce` (any case) mean reduced.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvPreference;

impl EnvPreference {
    fn parse(value: &str) -> bool {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "reduce"
        )
    }
}

impl MotionPreferenceSource for EnvPreference {
    fn prefers_reduced_motion(&self) -> MotionResult<bool> {
        Ok(std::env::var(REDUCED_MOTION_ENV)
            .map(|v| Self::parse(&v))
            .unwrap_or(false))
    }
}

/// Process-wide answer to "should animation run at all", fixed at construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ReducedMotionPolicy {
    reduced: bool,
}

impl ReducedMotionPolicy {
    /// Policy with an explicit value.
    pub fn new(reduced: bool) -> Self {
        Self { reduced }
    }

    /// Evaluate `source` once. A failing source means full motion.
    pub fn detect(source: &dyn MotionPreferenceSource) -> Self {
        let reduced = source.prefers_reduced_motion().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "reduced-motion preference unavailable; assuming full motion");
            false
        });
        tracing::debug!(reduced, "reduced-motion policy resolved");
        Self { reduced }
    }

    /// Whether animations collapse to their end state.
    pub fn is_reduced(&self) -> bool {
        self.reduced
    }
}

#[cfg(test)]
#[path = "../../tests/unit/motion/policy.rs"]
mod tests;
