//! Viewport-intersection gate.
//!
//! [`VisibilityGate`] turns raw intersection samples into enter/exit callbacks. Where the
//! samples come from is up to an [`ObserverBackend`]; a gate built without one treats
//! every anchor as visible the moment it is observed.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use super::options::{GateOptions, Tracking};
use crate::foundation::{
    core::AnchorId,
    error::{MotionError, MotionResult},
};

/// Identifier for one observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObservationHandle(pub u64);

/// Latest intersection state of an observed anchor.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct VisibilityRecord {
    /// Whether the anchor currently passes the observation threshold.
    pub visible: bool,
    /// Visible fraction of the anchor's box, `[0, 1]`.
    pub ratio: f64,
}

/// One intersection measurement for an observation, as produced by a backend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntersectionSample {
    /// Observation the sample belongs to.
    pub handle: ObservationHandle,
    /// Visible fraction of the anchor.
    pub ratio: f64,
    /// Whether the anchor touches the (margin-adjusted) root at all.
    pub intersecting: bool,
}

/// Callback fired on an enter or exit transition.
pub type GateCallback = Rc<dyn Fn()>;

/// Platform source of intersection samples.
pub trait ObserverBackend {
    /// Begin watching `anchor` for `handle`, delivering samples to `gate`.
    ///
    /// Return [`MotionError::Registration`] when the anchor does not exist; any other
    /// error makes the gate fall back to always-visible for this observation.
    fn watch(
        &self,
        gate: &VisibilityGate,
        handle: ObservationHandle,
        anchor: &AnchorId,
        options: &GateOptions,
    ) -> MotionResult<()>;

    /// Stop watching. Must tolerate handles that were never watched.
    fn unwatch(&self, handle: ObservationHandle);
}

struct Observation {
    anchor: AnchorId,
    options: GateOptions,
    on_enter: GateCallback,
    on_exit: Option<GateCallback>,
    record: Option<VisibilityRecord>,
    watched: bool,
}

#[derive(Default)]
struct GateState {
    next_id: u64,
    observations: BTreeMap<ObservationHandle, Observation>,
}

struct GateInner {
    state: RefCell<GateState>,
    backend: Option<Rc<dyn ObserverBackend>>,
}

/// Cheap-clone handle to a shared visibility gate.
#[derive(Clone)]
pub struct VisibilityGate {
    inner: Rc<GateInner>,
}

/// Non-owning gate handle, held by backends inside platform callbacks.
#[derive(Clone)]
pub struct WeakVisibilityGate {
    inner: Weak<GateInner>,
}

impl WeakVisibilityGate {
    /// Recover the gate if it is still alive.
    pub fn upgrade(&self) -> Option<VisibilityGate> {
        self.inner.upgrade().map(|inner| VisibilityGate { inner })
    }
}

impl VisibilityGate {
    /// Gate fed by `backend`.
    pub fn new(backend: Rc<dyn ObserverBackend>) -> Self {
        Self::build(Some(backend))
    }

    /// Gate for runtimes without intersection observation: every observed anchor is
    /// reported visible immediately and never exits.
    pub fn always_visible() -> Self {
        Self::build(None)
    }

    fn build(backend: Option<Rc<dyn ObserverBackend>>) -> Self {
        Self {
            inner: Rc::new(GateInner {
                state: RefCell::new(GateState::default()),
                backend,
            }),
        }
    }

    /// Whether a backend supplies real intersection data.
    pub fn is_supported(&self) -> bool {
        self.inner.backend.is_some()
    }

    /// Downgrade to a non-owning handle.
    pub fn downgrade(&self) -> WeakVisibilityGate {
        WeakVisibilityGate {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Start observing `anchor`.
    ///
    /// `on_enter` fires on each transition into visibility, including the very first
    /// sample when the anchor is already on screen. `on_exit` fires on transitions out
    /// and only when `options.tracking` is [`Tracking::Continuous`].
    pub fn observe(
        &self,
        anchor: AnchorId,
        options: GateOptions,
        on_enter: GateCallback,
        on_exit: Option<GateCallback>,
    ) -> MotionResult<ObservationHandle> {
        options.validate()?;
        let on_exit = match options.tracking {
            Tracking::Continuous => on_exit,
            Tracking::Once => None,
        };

        let handle = {
            let mut state = self.inner.state.borrow_mut();
            let handle = ObservationHandle(state.next_id);
            state.next_id += 1;
            state.observations.insert(
                handle,
                Observation {
                    anchor: anchor.clone(),
                    options,
                    on_enter,
                    on_exit,
                    record: None,
                    watched: false,
                },
            );
            handle
        };

        let watched = match &self.inner.backend {
            Some(backend) => match backend.watch(self, handle, &anchor, &options) {
                Ok(()) => true,
                Err(err @ MotionError::Registration(_)) => {
                    self.inner.state.borrow_mut().observations.remove(&handle);
                    return Err(err);
                }
                Err(err) => {
                    tracing::warn!(%anchor, error = %err, "intersection observation unavailable; treating anchor as visible");
                    false
                }
            },
            None => false,
        };

        if watched {
            if let Some(obs) = self.inner.state.borrow_mut().observations.get_mut(&handle) {
                obs.watched = true;
            }
            tracing::debug!(%anchor, observation = handle.0, "observing anchor");
        } else {
            self.deliver_one(IntersectionSample {
                handle,
                ratio: 1.0,
                intersecting: true,
            });
        }
        Ok(handle)
    }

    /// Stop observing. Returns `false` if the handle was already gone.
    pub fn unobserve(&self, handle: ObservationHandle) -> bool {
        let removed = self.inner.state.borrow_mut().observations.remove(&handle);
        match removed {
            Some(obs) => {
                if obs.watched {
                    if let Some(backend) = &self.inner.backend {
                        backend.unwatch(handle);
                    }
                }
                tracing::debug!(anchor = %obs.anchor, observation = handle.0, "stopped observing anchor");
                true
            }
            None => false,
        }
    }

    /// Feed samples from the backend. Callbacks run after the gate's own state has been
    /// updated, so they may observe or unobserve freely.
    pub fn deliver(&self, samples: impl IntoIterator<Item = IntersectionSample>) {
        for sample in samples {
            self.deliver_one(sample);
        }
    }

    fn deliver_one(&self, sample: IntersectionSample) {
        let callback = {
            let mut state = self.inner.state.borrow_mut();
            let Some(obs) = state.observations.get_mut(&sample.handle) else {
                return;
            };
            let ratio = sample.ratio.clamp(0.0, 1.0);
            let visible = obs.options.passes(ratio, sample.intersecting);
            let was_visible = obs.record.is_some_and(|r| r.visible);
            obs.record = Some(VisibilityRecord { visible, ratio });
            match (was_visible, visible) {
                (false, true) => Some(Rc::clone(&obs.on_enter)),
                (true, false) => obs.on_exit.clone(),
                _ => None,
            }
        };
        if let Some(cb) = callback {
            cb();
        }
    }

    /// Current state of an observation; `None` before its first sample or after removal.
    pub fn record(&self, handle: ObservationHandle) -> Option<VisibilityRecord> {
        self.inner
            .state
            .borrow()
            .observations
            .get(&handle)
            .and_then(|o| o.record)
    }

    /// Anchor behind an observation.
    pub fn anchor(&self, handle: ObservationHandle) -> Option<AnchorId> {
        self.inner
            .state
            .borrow()
            .observations
            .get(&handle)
            .map(|o| o.anchor.clone())
    }

    /// Number of live observations.
    pub fn observation_count(&self) -> usize {
        self.inner.state.borrow().observations.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gate/visibility.rs"]
mod tests;
