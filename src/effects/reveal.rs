use std::{cell::Cell, rc::Rc};

use crate::{
    effect::handle::{Effect, Policy, Tick},
    foundation::error::{MotionError, MotionResult},
};

/// Marks an element revealed once it has been visible for `delay_ms`.
pub struct RevealEffect {
    delay_ms: f64,
    revealed: Rc<Cell<bool>>,
}

impl RevealEffect {
    /// Reveal after `delay_ms` (0 reveals on the first frame).
    pub fn new(delay_ms: f64) -> MotionResult<Self> {
        if !(delay_ms.is_finite() && delay_ms >= 0.0) {
            return Err(MotionError::config(format!(
                "reveal delay must be >= 0 ms, got {delay_ms}"
            )));
        }
        Ok(Self {
            delay_ms,
            revealed: Rc::new(Cell::new(false)),
        })
    }

    /// Shared revealed flag.
    pub fn revealed(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.revealed)
    }
}

impl Effect for RevealEffect {
    fn name(&self) -> &str {
        "reveal"
    }

    fn policy(&self) -> Policy {
        Policy::OneShot
    }

    fn tick(&mut self, elapsed_ms: f64) -> MotionResult<Tick> {
        if elapsed_ms >= self.delay_ms {
            self.revealed.set(true);
            return Ok(Tick::Done);
        }
        Ok(Tick::Continue)
    }

    fn finish(&mut self) {
        self.revealed.set(true);
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({ "revealed": self.revealed.get() })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/reveal.rs"]
mod tests;
