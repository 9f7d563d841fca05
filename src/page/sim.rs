//! Headless page: wires geometry, gate, clock and registry from a [`PageConfig`] and
//! steps simulated time through the scroll and pointer timelines.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::{
    clock::frame_clock::{FrameClock, ManualDriver},
    effect::handle::{EffectHandle, HandleStats},
    effects::sections::SectionTracker,
    foundation::{
        core::{AnchorId, Point, Size},
        error::{MotionError, MotionResult},
    },
    gate::{
        geometry::{AnchorLayout, GeometryObserver, Viewport},
        visibility::VisibilityGate,
    },
    motion::policy::{EnvPreference, ReducedMotionPolicy},
    page::{
        build::{Assembled, EffectInputs},
        config::{EffectSpec, PageConfig},
    },
    registry::binding::{EffectId, EffectRegistry},
    theme::scheme::{MemoryThemeStore, Theme, ThemeController},
};

/// Scroll offset past which the nav bar switches to its compact style.
pub const NAV_SCROLLED_AFTER_PX: f64 = 50.0;

/// Most frames a single [`Simulation::run`] will step through.
pub const MAX_RUN_STEPS: u64 = 10_000_000;

/// Per-effect outcome.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct EffectReport {
    /// Effect kind.
    pub kind: &'static str,
    /// Anchor the effect was gated on.
    pub anchor: AnchorId,
    /// Whether registration succeeded.
    pub registered: bool,
    /// Registry id while tracked; `None` once completed, when untracked under reduced
    /// motion, or when registration failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EffectId>,
    /// Why the effect is not running, if it was rejected or skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Lifecycle counters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<HandleStats>,
    /// Final visual state.
    pub state: serde_json::Value,
}

/// Summary of a simulation run.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SimulationReport {
    /// Simulated time reached.
    pub until_ms: f64,
    /// Whether reduced motion was in force.
    pub reduced_motion: bool,
    /// Frames delivered by the clock.
    pub frames_delivered: u64,
    /// Frame requests the clock made of its driver.
    pub frame_requests: u64,
    /// Live frame subscriptions held by effects.
    pub live_subscriptions: usize,
    /// Gate observations held by effects.
    pub observations: usize,
    /// Most recently entered section.
    pub active_section: Option<AnchorId>,
    /// Final vertical scroll offset.
    pub scroll_y: f64,
    /// Whether the nav bar is in its scrolled style.
    pub nav_scrolled: bool,
    /// Whether the page ended hidden, with frame delivery suspended.
    pub page_hidden: bool,
    /// Active theme.
    pub theme: Theme,
    /// One entry per configured effect, in config order.
    pub effects: Vec<EffectReport>,
}

struct SimEffect {
    kind: &'static str,
    anchor: AnchorId,
    id: Option<EffectId>,
    handle: Option<Rc<RefCell<EffectHandle>>>,
    error: Option<String>,
}

/// A page running headless.
pub struct Simulation {
    page: PageConfig,
    geometry: Rc<GeometryObserver>,
    gate: VisibilityGate,
    driver: Rc<ManualDriver>,
    registry: EffectRegistry,
    sections: SectionTracker,
    theme: ThemeController<MemoryThemeStore>,
    pointer: Rc<Cell<Option<Point>>>,
    effects: Vec<SimEffect>,
    now_ms: f64,
    stepped: bool,
    next_scroll: usize,
    next_pointer: usize,
    next_visibility: usize,
}

impl Simulation {
    /// Build the page. `motion` overrides the page's `reduced_motion` flag and the
    /// environment; without it either of those can turn reduced motion on.
    ///
    /// Individual effects or sections that fail to register are recorded in the report
    /// and do not fail construction.
    pub fn new(page: PageConfig, motion: Option<ReducedMotionPolicy>) -> MotionResult<Self> {
        page.validate()?;
        let motion = motion.unwrap_or_else(|| {
            if page.reduced_motion {
                ReducedMotionPolicy::new(true)
            } else {
                ReducedMotionPolicy::detect(&EnvPreference)
            }
        });

        let mut layout = AnchorLayout::new();
        for (anchor, b) in &page.anchors {
            layout.place(anchor.clone(), b.to_rect());
        }
        let viewport = Viewport::new(Size::new(page.viewport.width, page.viewport.height));
        let geometry = Rc::new(GeometryObserver::new(layout, viewport));
        let gate = VisibilityGate::new(geometry.clone());
        let driver = Rc::new(ManualDriver::default());
        let clock = FrameClock::with_driver(driver.clone());
        let registry = EffectRegistry::new(clock, gate.clone(), motion);
        let sections = SectionTracker::new(gate.clone());
        let theme = ThemeController::restore(MemoryThemeStore::with_raw(page.theme.to_string()));

        let mut sim = Self {
            page,
            geometry,
            gate,
            driver,
            registry,
            sections,
            theme,
            pointer: Rc::new(Cell::new(None)),
            effects: Vec::new(),
            now_ms: 0.0,
            stepped: false,
            next_scroll: 0,
            next_pointer: 0,
            next_visibility: 0,
        };
        sim.driver.set_now(0.0);
        sim.apply_events(0.0);
        sim.register_all();
        Ok(sim)
    }

    fn register_all(&mut self) {
        let specs = self.page.effects.clone();
        for spec in &specs {
            let entry = self.register_one(spec);
            self.effects.push(entry);
        }
        for section in self.page.sections.clone() {
            if let Err(err) = self.sections.attach(section.clone()) {
                tracing::warn!(%section, error = %err, "section not tracked");
            }
        }
    }

    fn register_one(&self, spec: &EffectSpec) -> SimEffect {
        let mut entry = SimEffect {
            kind: spec.kind.label(),
            anchor: spec.anchor.clone(),
            id: None,
            handle: None,
            error: None,
        };
        let effect = match spec.build(&self.inputs()) {
            Ok(Assembled::Ready(effect)) => effect,
            Ok(Assembled::Skipped(reason)) => {
                entry.error = Some(reason);
                return entry;
            }
            Err(err) => {
                entry.error = Some(err.to_string());
                return entry;
            }
        };
        let handle = Rc::new(RefCell::new(EffectHandle::new(effect)));
        match self.registry.register_shared(
            Rc::clone(&handle),
            spec.anchor.clone(),
            spec.gate_options(),
        ) {
            Ok(id) => {
                entry.id = Some(id);
                entry.handle = Some(handle);
            }
            Err(err) => entry.error = Some(err.to_string()),
        }
        entry
    }

    fn inputs(&self) -> EffectInputs {
        EffectInputs {
            layout: self.geometry.clone(),
            theme: self.theme.shared(),
            pointer: Rc::clone(&self.pointer),
            viewport_width: self.page.viewport.width,
            touch: self.page.viewport.touch,
        }
    }

    fn apply_events(&mut self, t: f64) {
        while let Some(e) = self.page.scroll.get(self.next_scroll) {
            if e.at_ms > t {
                break;
            }
            self.geometry.scroll_to(e.y);
            self.next_scroll += 1;
        }
        while let Some(e) = self.page.pointer.get(self.next_pointer) {
            if e.at_ms > t {
                break;
            }
            self.pointer.set(e.position());
            self.next_pointer += 1;
        }
        while let Some(e) = self.page.visibility.get(self.next_visibility) {
            if e.at_ms > t {
                break;
            }
            let clock = self.registry.clock();
            if e.hidden {
                clock.suspend();
            } else {
                clock.resume();
            }
            self.next_visibility += 1;
        }
    }

    /// Advance to `t`: apply timeline events due, deliver intersection samples, then
    /// deliver one frame if anything is subscribed and the page is not hidden.
    pub fn step_to(&mut self, t: f64) {
        let t = t.max(self.now_ms);
        self.driver.set_now(t);
        self.apply_events(t);
        self.geometry.refresh(&self.gate);
        let clock = self.registry.clock();
        if clock.subscriber_count() > 0 && !clock.is_suspended() {
            clock.frame(t);
        }
        self.now_ms = t;
        self.stepped = true;
    }

    /// Step from the current time to `until_ms` every `step_ms` and report.
    ///
    /// Fails without stepping when the run would take more than [`MAX_RUN_STEPS`] frames.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn run(&mut self, until_ms: f64, step_ms: f64) -> MotionResult<SimulationReport> {
        if !(step_ms.is_finite() && step_ms > 0.0) {
            return Err(MotionError::config(format!(
                "step must be > 0 ms, got {step_ms}"
            )));
        }
        if !until_ms.is_finite() {
            return Err(MotionError::config("until must be finite"));
        }
        let start = if self.stepped {
            self.now_ms + step_ms
        } else {
            self.now_ms
        };
        let span = until_ms - start;
        let steps = if span < 0.0 {
            0.0
        } else {
            (span / step_ms).floor() + 1.0
        };
        if steps > MAX_RUN_STEPS as f64 {
            return Err(MotionError::config(format!(
                "{span} ms at {step_ms} ms per step exceeds {MAX_RUN_STEPS} steps"
            )));
        }
        for n in 0..steps as u64 {
            let t = start + n as f64 * step_ms;
            if t > until_ms {
                break;
            }
            self.step_to(t);
        }
        if self.now_ms < until_ms {
            self.step_to(until_ms);
        }
        tracing::debug!(
            frames = self.registry.clock().frames_delivered(),
            live = self.registry.active_subscriptions(),
            "simulation finished"
        );
        Ok(self.report())
    }

    /// Snapshot of the page as it stands.
    pub fn report(&self) -> SimulationReport {
        let scroll_y = self.geometry.viewport().scroll.y;
        SimulationReport {
            until_ms: self.now_ms,
            reduced_motion: self.registry.motion().is_reduced(),
            frames_delivered: self.registry.clock().frames_delivered(),
            frame_requests: self.driver.requests(),
            live_subscriptions: self.registry.active_subscriptions(),
            observations: self.registry.observations(),
            active_section: self.sections.active(),
            scroll_y,
            nav_scrolled: scroll_y > NAV_SCROLLED_AFTER_PX,
            page_hidden: self.registry.clock().is_suspended(),
            theme: self.theme.theme(),
            effects: self
                .effects
                .iter()
                .map(|e| {
                    let handle = e.handle.as_ref().map(|h| h.borrow());
                    EffectReport {
                        kind: e.kind,
                        anchor: e.anchor.clone(),
                        registered: e.handle.is_some(),
                        id: e.id.filter(|id| self.registry.contains(*id)),
                        error: e.error.clone(),
                        stats: handle.as_ref().map(|h| h.stats()),
                        state: handle.map_or(serde_json::Value::Null, |h| h.snapshot()),
                    }
                })
                .collect(),
        }
    }

    /// Flip the theme. Ambient blobs pick it up on their next frame.
    pub fn toggle_theme(&self) -> Theme {
        self.theme.toggle()
    }

    /// Current simulated time.
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// The registry driving the page's effects.
    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    /// Headless layout and viewport.
    pub fn geometry(&self) -> &GeometryObserver {
        &self.geometry
    }

    /// Active-section tracker.
    pub fn sections(&self) -> &SectionTracker {
        &self.sections
    }

    /// Shared pointer position read by the cursor glow.
    pub fn pointer(&self) -> Rc<Cell<Option<Point>>> {
        Rc::clone(&self.pointer)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/page/sim.rs"]
mod tests;
