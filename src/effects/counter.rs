use std::{cell::Cell, rc::Rc};

use crate::{
    effect::{
        ease::Ease,
        handle::{Effect, Policy, Tick},
    },
    foundation::error::{MotionError, MotionResult},
};

/// Default counting time.
pub const DEFAULT_COUNTER_DURATION_MS: f64 = 2000.0;

/// Counts a number up from zero once its anchor scrolls into view.
pub struct CounterEffect {
    target: i64,
    duration_ms: f64,
    ease: Ease,
    display: Rc<Cell<i64>>,
}

impl CounterEffect {
    /// Counter reaching `target` after `duration_ms` on an out-cubic curve.
    pub fn new(target: i64, duration_ms: f64) -> MotionResult<Self> {
        if !(duration_ms.is_finite() && duration_ms > 0.0) {
            return Err(MotionError::config(format!(
                "counter duration must be > 0 ms, got {duration_ms}"
            )));
        }
        Ok(Self {
            target,
            duration_ms,
            ease: Ease::OutCubic,
            display: Rc::new(Cell::new(0)),
        })
    }

    /// Replace the easing curve.
    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// Shared cell holding the number currently shown.
    pub fn display(&self) -> Rc<Cell<i64>> {
        Rc::clone(&self.display)
    }

    /// Number shown `elapsed_ms` into the count.
    pub fn value_at(&self, elapsed_ms: f64) -> i64 {
        let eased = self.ease.apply(Ease::progress(elapsed_ms, self.duration_ms));
        (eased * self.target as f64).round() as i64
    }
}

impl Effect for CounterEffect {
    fn name(&self) -> &str {
        "counter"
    }

    fn policy(&self) -> Policy {
        Policy::OneShot
    }

    fn tick(&mut self, elapsed_ms: f64) -> MotionResult<Tick> {
        self.display.set(self.value_at(elapsed_ms));
        if elapsed_ms >= self.duration_ms {
            Ok(Tick::Done)
        } else {
            Ok(Tick::Continue)
        }
    }

    fn finish(&mut self) {
        self.display.set(self.target);
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({ "value": self.display.get(), "target": self.target })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/counter.rs"]
mod tests;
