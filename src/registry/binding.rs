//! Binds visibility to frame subscriptions, one effect at a time.
//!
//! Per effect the registry keeps at most one frame subscription and at most one gate
//! observation. Gate "enter" subscribes and activates, gate "exit" (continuous
//! tracking only) unsubscribes and deactivates, and a tick reporting [`Tick::Done`]
//! releases everything the effect holds.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use crate::{
    clock::frame_clock::{FrameClock, SubscriptionId},
    effect::handle::{Effect, EffectHandle, HandleStats, Phase, Policy, Tick},
    foundation::{
        core::AnchorId,
        error::{MotionError, MotionResult},
    },
    gate::{
        options::{GateOptions, Tracking},
        visibility::{GateCallback, ObservationHandle, VisibilityGate},
    },
    motion::policy::ReducedMotionPolicy,
};

/// Identifier for a registered effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct EffectId(pub u64);

/// Gate options matching a policy: entry-only for one-shot effects, entry-and-exit for
/// continuous ones, any intersection counts.
pub fn default_gate_options(policy: Policy) -> GateOptions {
    match policy {
        Policy::OneShot => GateOptions::once(0.0),
        Policy::Continuous => GateOptions::continuous(0.0),
    }
}

struct Entry {
    anchor: AnchorId,
    tracking: Tracking,
    handle: Rc<RefCell<EffectHandle>>,
    observation: Option<ObservationHandle>,
    subscription: Option<SubscriptionId>,
}

struct RegistryInner {
    clock: FrameClock,
    gate: VisibilityGate,
    motion: ReducedMotionPolicy,
    entries: RefCell<BTreeMap<EffectId, Entry>>,
    next_id: Cell<u64>,
}

/// Cheap-clone handle to an effect registry.
#[derive(Clone)]
pub struct EffectRegistry {
    inner: Rc<RegistryInner>,
}

impl EffectRegistry {
    /// Registry scheduling on `clock`, gated by `gate`, under `motion`.
    pub fn new(clock: FrameClock, gate: VisibilityGate, motion: ReducedMotionPolicy) -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                clock,
                gate,
                motion,
                entries: RefCell::new(BTreeMap::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Shared frame clock.
    pub fn clock(&self) -> &FrameClock {
        &self.inner.clock
    }

    /// Shared visibility gate.
    pub fn gate(&self) -> &VisibilityGate {
        &self.inner.gate
    }

    /// Reduced-motion policy in force.
    pub fn motion(&self) -> ReducedMotionPolicy {
        self.inner.motion
    }

    /// Register `effect` on `anchor`. See [`Self::register_shared`].
    pub fn register(
        &self,
        effect: Box<dyn Effect>,
        anchor: AnchorId,
        options: GateOptions,
    ) -> MotionResult<EffectId> {
        self.register_shared(Rc::new(RefCell::new(EffectHandle::new(effect))), anchor, options)
    }

    /// Register an effect whose handle the caller also keeps for inspection.
    ///
    /// Under reduced motion the effect is activated and jumped to its end state right
    /// away; nothing is observed or scheduled and the returned id is not tracked.
    /// Otherwise the anchor is observed and the effect starts ticking on entry.
    ///
    /// A missing anchor or invalid options fail this registration only.
    #[tracing::instrument(level = "debug", skip(self, handle, options), fields(effect))]
    pub fn register_shared(
        &self,
        handle: Rc<RefCell<EffectHandle>>,
        anchor: AnchorId,
        options: GateOptions,
    ) -> MotionResult<EffectId> {
        let id = EffectId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        tracing::Span::current().record("effect", handle.borrow().name());

        if self.inner.motion.is_reduced() {
            let mut h = handle.borrow_mut();
            h.activate();
            h.jump_to_end();
            tracing::debug!(effect = h.name(), "reduced motion: applied end state");
            return Ok(id);
        }

        self.inner.entries.borrow_mut().insert(
            id,
            Entry {
                anchor: anchor.clone(),
                tracking: options.tracking,
                handle,
                observation: None,
                subscription: None,
            },
        );

        let on_enter: GateCallback = {
            let weak = Rc::downgrade(&self.inner);
            Rc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    RegistryInner::start(&inner, id);
                }
            })
        };
        let on_exit: Option<GateCallback> = match options.tracking {
            Tracking::Continuous => {
                let weak = Rc::downgrade(&self.inner);
                Some(Rc::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.stop(id);
                    }
                }))
            }
            Tracking::Once => None,
        };

        match self
            .inner
            .gate
            .observe(anchor.clone(), options, on_enter, on_exit)
        {
            Ok(observation) => {
                let stale = {
                    let mut entries = self.inner.entries.borrow_mut();
                    match entries.get_mut(&id) {
                        // One-shot observation already satisfied during `observe`.
                        Some(entry)
                            if entry.tracking == Tracking::Once
                                && entry.subscription.is_some() =>
                        {
                            true
                        }
                        Some(entry) => {
                            entry.observation = Some(observation);
                            false
                        }
                        None => true,
                    }
                };
                if stale {
                    self.inner.gate.unobserve(observation);
                }
                Ok(id)
            }
            Err(err) => {
                let entry = self.inner.entries.borrow_mut().remove(&id);
                if let Some(entry) = entry {
                    self.inner.release(entry);
                }
                tracing::warn!(%anchor, error = %err, "effect registration skipped");
                if matches!(err, MotionError::Registration(_)) {
                    Err(err)
                } else {
                    Err(MotionError::registration(format!("anchor '{anchor}': {err}")))
                }
            }
        }
    }

    /// Remove an effect, releasing its subscription and observation. Returns `false`
    /// if it was not registered (or already completed).
    pub fn unregister(&self, id: EffectId) -> bool {
        self.inner.retire(id, "unregistered")
    }

    /// Unregister everything. Returns the number of effects released.
    pub fn teardown(&self) -> usize {
        let released = self.inner.release_all();
        tracing::debug!(released, "registry torn down");
        released
    }

    /// Number of registered (not yet completed) effects.
    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    /// Whether no effects are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: EffectId) -> bool {
        self.inner.entries.borrow().contains_key(&id)
    }

    /// Live frame subscriptions held by `id`: always 0 or 1.
    pub fn subscriptions_for(&self, id: EffectId) -> usize {
        self.inner
            .entries
            .borrow()
            .get(&id)
            .and_then(|e| e.subscription)
            .filter(|s| self.inner.clock.is_subscribed(*s))
            .map_or(0, |_| 1)
    }

    /// Live frame subscriptions held by all effects.
    pub fn active_subscriptions(&self) -> usize {
        let entries = self.inner.entries.borrow();
        entries
            .values()
            .filter_map(|e| e.subscription)
            .filter(|s| self.inner.clock.is_subscribed(*s))
            .count()
    }

    /// Gate observations held by all effects.
    pub fn observations(&self) -> usize {
        self.inner
            .entries
            .borrow()
            .values()
            .filter(|e| e.observation.is_some())
            .count()
    }

    /// Lifecycle counters for a registered effect.
    pub fn stats(&self, id: EffectId) -> Option<HandleStats> {
        self.inner
            .entries
            .borrow()
            .get(&id)
            .map(|e| e.handle.borrow().stats())
    }
}

impl RegistryInner {
    fn start(inner: &Rc<Self>, id: EffectId) {
        let (handle, satisfied) = {
            let mut entries = inner.entries.borrow_mut();
            let Some(entry) = entries.get_mut(&id) else {
                return;
            };
            if entry
                .subscription
                .is_some_and(|s| inner.clock.is_subscribed(s))
            {
                return;
            }
            if entry.handle.borrow().phase() == Phase::Finished {
                return;
            }
            let satisfied = match entry.tracking {
                Tracking::Once => entry.observation.take(),
                Tracking::Continuous => None,
            };
            (Rc::clone(&entry.handle), satisfied)
        };

        let weak: Weak<Self> = Rc::downgrade(inner);
        let subscription = inner.clock.subscribe(Box::new(move |ts| match weak.upgrade() {
            Some(inner) => inner.on_frame(id, ts),
            None => Err(MotionError::tick("registry dropped")),
        }));
        if let Some(entry) = inner.entries.borrow_mut().get_mut(&id) {
            entry.subscription = Some(subscription);
        }
        handle.borrow_mut().activate_at(inner.clock.now_ms());

        if let Some(observation) = satisfied {
            inner.gate.unobserve(observation);
        }
    }

    fn stop(&self, id: EffectId) {
        let (subscription, handle) = {
            let mut entries = self.entries.borrow_mut();
            let Some(entry) = entries.get_mut(&id) else {
                return;
            };
            (entry.subscription.take(), Rc::clone(&entry.handle))
        };
        if let Some(subscription) = subscription {
            self.clock.unsubscribe(subscription);
        }
        handle.borrow_mut().deactivate();
    }

    fn on_frame(&self, id: EffectId, timestamp_ms: f64) -> MotionResult<()> {
        let handle = match self.entries.borrow().get(&id) {
            Some(entry) => Rc::clone(&entry.handle),
            None => return Ok(()),
        };
        let outcome = handle.borrow_mut().tick(timestamp_ms);
        match outcome {
            Ok(Tick::Continue) => Ok(()),
            Ok(Tick::Done) => {
                self.retire(id, "completed");
                Ok(())
            }
            Err(err) => {
                self.retire(id, "failed");
                Err(err)
            }
        }
    }

    fn retire(&self, id: EffectId, reason: &'static str) -> bool {
        let entry = self.entries.borrow_mut().remove(&id);
        match entry {
            Some(entry) => {
                tracing::debug!(effect = entry.handle.borrow().name(), anchor = %entry.anchor, reason, "effect released");
                self.release(entry);
                true
            }
            None => false,
        }
    }

    fn release(&self, entry: Entry) {
        if let Some(subscription) = entry.subscription {
            self.clock.unsubscribe(subscription);
        }
        entry.handle.borrow_mut().deactivate();
        if let Some(observation) = entry.observation {
            self.gate.unobserve(observation);
        }
    }

    fn release_all(&self) -> usize {
        let entries = std::mem::take(&mut *self.entries.borrow_mut());
        let released = entries.len();
        for entry in entries.into_values() {
            self.release(entry);
        }
        released
    }
}

impl Drop for RegistryInner {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/registry/binding.rs"]
mod tests;
