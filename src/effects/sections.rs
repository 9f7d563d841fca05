use std::{cell::RefCell, rc::Rc};

use crate::{
    foundation::{core::AnchorId, error::MotionResult},
    gate::{
        options::{GateOptions, MarginLength, RootMargin},
        visibility::{ObservationHandle, VisibilityGate},
    },
};

/// Gate options used for section tracking: 30% visible inside a viewport shrunk by
/// the fixed nav bar at the top and the lower 40%.
pub fn section_gate_options() -> GateOptions {
    GateOptions::continuous(0.3).with_root_margin(RootMargin {
        top: MarginLength::Px(-72.0),
        right: MarginLength::Px(0.0),
        bottom: MarginLength::Percent(-40.0),
        left: MarginLength::Px(0.0),
    })
}

/// Tracks which page section the reader is in.
///
/// The most recently entered section wins; leaving a section never clears it.
pub struct SectionTracker {
    gate: VisibilityGate,
    active: Rc<RefCell<Option<AnchorId>>>,
    observations: RefCell<Vec<ObservationHandle>>,
}

impl SectionTracker {
    /// Tracker observing through `gate`.
    pub fn new(gate: VisibilityGate) -> Self {
        Self {
            gate,
            active: Rc::new(RefCell::new(None)),
            observations: RefCell::new(Vec::new()),
        }
    }

    /// Start tracking `section`.
    pub fn attach(&self, section: AnchorId) -> MotionResult<ObservationHandle> {
        let active = Rc::clone(&self.active);
        let entered = section.clone();
        let handle = self.gate.observe(
            section,
            section_gate_options(),
            Rc::new(move || {
                tracing::debug!(section = %entered, "section entered");
                *active.borrow_mut() = Some(entered.clone());
            }),
            None,
        )?;
        self.observations.borrow_mut().push(handle);
        Ok(handle)
    }

    /// Section currently marked active.
    pub fn active(&self) -> Option<AnchorId> {
        self.active.borrow().clone()
    }

    /// Whether `section` is the active one.
    pub fn is_current(&self, section: &AnchorId) -> bool {
        self.active.borrow().as_ref() == Some(section)
    }

    /// Number of attached sections.
    pub fn len(&self) -> usize {
        self.observations.borrow().len()
    }

    /// Whether nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.observations.borrow().is_empty()
    }

    /// Stop tracking every section. The active section is kept.
    pub fn detach(&self) -> usize {
        let handles = std::mem::take(&mut *self.observations.borrow_mut());
        handles.into_iter().filter(|h| self.gate.unobserve(*h)).count()
    }
}

impl Drop for SectionTracker {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/sections.rs"]
mod tests;
