//! Effect contract and its lifecycle wrapper.

use crate::foundation::error::MotionResult;

/// Result of one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tick {
    /// Keep delivering frames.
    Continue,
    /// The effect reached its end state; stop and release it.
    Done,
}

/// How long an effect runs once activated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Runs until deactivated from outside (ambient background, cursor follow).
    Continuous,
    /// Runs until its own progress completes, then releases itself (counters, reveals).
    OneShot,
}

/// A visual effect driven by frame ticks.
///
/// `tick` receives the time since the current activation began and must not assume a
/// fixed frame interval.
pub trait Effect {
    /// Short label for logs and reports.
    fn name(&self) -> &str;

    /// Completion policy.
    fn policy(&self) -> Policy;

    /// Called once when the effect starts receiving ticks.
    fn on_activate(&mut self) {}

    /// Called once when the effect stops receiving ticks.
    fn on_deactivate(&mut self) {}

    /// Advance to `elapsed_ms` since activation.
    fn tick(&mut self, elapsed_ms: f64) -> MotionResult<Tick>;

    /// Apply the final visual state without animating (reduced motion).
    fn finish(&mut self);

    /// Current visual state, for reports and debugging.
    fn snapshot(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

/// Lifecycle position of a wrapped effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Registered, not ticking.
    Idle,
    /// Ticking.
    Active,
    /// Completed; will not activate again.
    Finished,
}

/// Counters describing what a handle has been through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct HandleStats {
    /// Current phase.
    pub phase: Phase,
    /// Idle -> Active transitions.
    pub activations: u32,
    /// Active -> Idle/Finished transitions.
    pub deactivations: u32,
    /// Ticks delivered to the effect.
    pub ticks: u64,
}

/// Wraps one [`Effect`], making activation idempotent and translating frame
/// timestamps into elapsed time.
pub struct EffectHandle {
    effect: Box<dyn Effect>,
    phase: Phase,
    completed: bool,
    started_at: Option<f64>,
    activations: u32,
    deactivations: u32,
    ticks: u64,
}

impl EffectHandle {
    /// Wrap `effect` in the idle phase.
    pub fn new(effect: Box<dyn Effect>) -> Self {
        Self {
            effect,
            phase: Phase::Idle,
            completed: false,
            started_at: None,
            activations: 0,
            deactivations: 0,
            ticks: 0,
        }
    }

    /// Effect label.
    pub fn name(&self) -> &str {
        self.effect.name()
    }

    /// Effect policy.
    pub fn policy(&self) -> Policy {
        self.effect.policy()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Enter the active phase, timing from the first frame delivered afterwards.
    /// Returns `false` (and does nothing) when already active or finished.
    pub fn activate(&mut self) -> bool {
        self.activate_at(None)
    }

    /// Enter the active phase at `now_ms` on the frame timestamp timeline; without a
    /// time, elapsed is measured from the first frame instead.
    pub fn activate_at(&mut self, now_ms: Option<f64>) -> bool {
        if self.phase != Phase::Idle {
            return false;
        }
        self.phase = Phase::Active;
        self.started_at = now_ms.filter(|t| t.is_finite());
        self.activations += 1;
        self.effect.on_activate();
        tracing::debug!(effect = self.effect.name(), "effect activated");
        true
    }

    /// Leave the active phase. Returns `false` when not active.
    pub fn deactivate(&mut self) -> bool {
        if self.phase != Phase::Active {
            return false;
        }
        self.phase = if self.completed {
            Phase::Finished
        } else {
            Phase::Idle
        };
        self.deactivations += 1;
        self.effect.on_deactivate();
        tracing::debug!(effect = self.effect.name(), "effect deactivated");
        true
    }

    /// Deliver the frame at `timestamp_ms`. Elapsed time counts from the activation
    /// time, or from the first frame when none was given, and never goes negative.
    /// Inactive handles report [`Tick::Done`] without touching the effect.
    pub fn tick(&mut self, timestamp_ms: f64) -> MotionResult<Tick> {
        if self.phase != Phase::Active || self.completed {
            return Ok(Tick::Done);
        }
        let started = *self.started_at.get_or_insert(timestamp_ms);
        let elapsed = (timestamp_ms - started).max(0.0);
        self.ticks += 1;
        let outcome = self.effect.tick(elapsed)?;
        if outcome == Tick::Done {
            self.completed = true;
        }
        Ok(outcome)
    }

    /// Apply the end state synchronously and mark the handle finished.
    pub fn jump_to_end(&mut self) {
        self.effect.finish();
        self.completed = true;
        self.phase = Phase::Finished;
    }

    /// Lifecycle counters.
    pub fn stats(&self) -> HandleStats {
        HandleStats {
            phase: self.phase,
            activations: self.activations,
            deactivations: self.deactivations,
            ticks: self.ticks,
        }
    }

    /// Effect snapshot.
    pub fn snapshot(&self) -> serde_json::Value {
        self.effect.snapshot()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effect/handle.rs"]
mod tests;
