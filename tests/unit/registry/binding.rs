use super::*;
use crate::{
    foundation::core::{Rect, Size},
    gate::geometry::{AnchorLayout, GeometryObserver, Viewport},
};

#[derive(Default)]
struct Counts {
    activations: u32,
    deactivations: u32,
    ticks: Vec<f64>,
    finished: u32,
}

struct TestEffect {
    counts: Rc<RefCell<Counts>>,
    policy: Policy,
    done_after_ms: Option<f64>,
    fail_on_tick: Option<usize>,
}

impl Effect for TestEffect {
    fn name(&self) -> &str {
        "test"
    }

    fn policy(&self) -> Policy {
        self.policy
    }

    fn on_activate(&mut self) {
        self.counts.borrow_mut().activations += 1;
    }

    fn on_deactivate(&mut self) {
        self.counts.borrow_mut().deactivations += 1;
    }

    fn tick(&mut self, elapsed_ms: f64) -> MotionResult<Tick> {
        let mut counts = self.counts.borrow_mut();
        counts.ticks.push(elapsed_ms);
        if self.fail_on_tick == Some(counts.ticks.len()) {
            return Err(MotionError::tick("boom"));
        }
        Ok(match self.done_after_ms {
            Some(d) if elapsed_ms >= d => Tick::Done,
            _ => Tick::Continue,
        })
    }

    fn finish(&mut self) {
        self.counts.borrow_mut().finished += 1;
    }
}

fn effect(policy: Policy, done_after_ms: Option<f64>) -> (Box<dyn Effect>, Rc<RefCell<Counts>>) {
    let counts = Rc::new(RefCell::new(Counts::default()));
    let effect: Box<dyn Effect> = Box::new(TestEffect {
        counts: Rc::clone(&counts),
        policy,
        done_after_ms,
        fail_on_tick: None,
    });
    (effect, counts)
}

fn anchor(id: &str) -> AnchorId {
    AnchorId::new(id).unwrap()
}

struct Page {
    observer: Rc<GeometryObserver>,
    registry: EffectRegistry,
}

impl Page {
    fn new(reduced: bool) -> Self {
        let mut layout = AnchorLayout::new();
        layout.place(anchor("top"), Rect::new(0.0, 0.0, 800.0, 400.0));
        layout.place(anchor("below"), Rect::new(0.0, 2000.0, 800.0, 2400.0));
        let observer = Rc::new(GeometryObserver::new(
            layout,
            Viewport::new(Size::new(1280.0, 800.0)),
        ));
        let gate = VisibilityGate::new(observer.clone());
        let registry =
            EffectRegistry::new(FrameClock::new(), gate, ReducedMotionPolicy::new(reduced));
        Self { observer, registry }
    }

    fn refresh(&self) {
        self.observer.refresh(self.registry.gate());
    }
}

#[test]
fn reduced_motion_applies_end_state_without_scheduling() {
    let page = Page::new(true);
    let (e, counts) = effect(Policy::OneShot, Some(100.0));
    page.registry
        .register(e, anchor("below"), GateOptions::once(0.5))
        .unwrap();

    let c = counts.borrow();
    assert_eq!((c.activations, c.finished), (1, 1));
    assert!(c.ticks.is_empty());
    assert_eq!(page.registry.clock().subscriber_count(), 0);
    assert_eq!(page.registry.gate().observation_count(), 0);
    assert!(page.registry.is_empty());
}

#[test]
fn continuous_effect_follows_visibility() {
    let page = Page::new(false);
    let (e, counts) = effect(Policy::Continuous, None);
    let id = page
        .registry
        .register(e, anchor("below"), default_gate_options(Policy::Continuous))
        .unwrap();

    page.refresh();
    assert_eq!(page.registry.subscriptions_for(id), 0);

    page.observer.scroll_to(1800.0);
    page.refresh();
    page.refresh();
    assert_eq!(page.registry.subscriptions_for(id), 1);
    assert_eq!(page.registry.clock().subscriber_count(), 1);

    page.registry.clock().frame(10.0);
    page.registry.clock().frame(26.0);

    page.observer.scroll_to(0.0);
    page.refresh();
    assert_eq!(page.registry.subscriptions_for(id), 0);
    page.registry.clock().frame(42.0);

    let c = counts.borrow();
    assert_eq!((c.activations, c.deactivations), (1, 1));
    assert_eq!(c.ticks, vec![0.0, 16.0]);
    assert!(page.registry.contains(id));
    assert_eq!(page.registry.observations(), 1);
}

#[test]
fn one_shot_completes_and_releases_everything() {
    let page = Page::new(false);
    let (e, counts) = effect(Policy::OneShot, Some(32.0));
    let id = page
        .registry
        .register(e, anchor("top"), GateOptions::once(0.5))
        .unwrap();
    assert_eq!(page.registry.observations(), 1);

    page.refresh();
    assert_eq!(page.registry.subscriptions_for(id), 1);
    // One-shot observations are dropped on first entry.
    assert_eq!(page.registry.gate().observation_count(), 0);

    for ts in [0.0, 16.0, 32.0, 48.0, 64.0] {
        page.registry.clock().frame(ts);
    }
    let c = counts.borrow();
    assert_eq!(c.ticks, vec![0.0, 16.0, 32.0]);
    assert_eq!((c.activations, c.deactivations), (1, 1));
    assert!(!page.registry.contains(id));
    assert_eq!(page.registry.clock().subscriber_count(), 0);
}

#[test]
fn failing_effect_is_retired_and_neighbours_keep_ticking() {
    let page = Page::new(false);
    let bad_counts = Rc::new(RefCell::new(Counts::default()));
    let bad = Box::new(TestEffect {
        counts: Rc::clone(&bad_counts),
        policy: Policy::Continuous,
        done_after_ms: None,
        fail_on_tick: Some(3),
    });
    let (good, good_counts) = effect(Policy::Continuous, None);
    let bad_id = page
        .registry
        .register(bad, anchor("top"), GateOptions::continuous(0.0))
        .unwrap();
    page.registry
        .register(good, anchor("top"), GateOptions::continuous(0.0))
        .unwrap();
    page.refresh();

    for ts in [0.0, 16.0, 32.0, 48.0] {
        page.registry.clock().frame(ts);
    }
    assert_eq!(bad_counts.borrow().ticks.len(), 3);
    assert_eq!(bad_counts.borrow().deactivations, 1);
    assert_eq!(good_counts.borrow().ticks.len(), 4);
    assert!(!page.registry.contains(bad_id));
    assert_eq!(page.registry.active_subscriptions(), 1);
}

#[test]
fn missing_anchor_skips_only_that_effect() {
    let page = Page::new(false);
    let (ghost, _) = effect(Policy::OneShot, None);
    let (real, _) = effect(Policy::OneShot, None);
    let err = page
        .registry
        .register(ghost, anchor("ghost"), GateOptions::once(0.1))
        .unwrap_err();
    assert!(matches!(err, MotionError::Registration(_)));
    page.registry
        .register(real, anchor("top"), GateOptions::once(0.1))
        .unwrap();
    assert_eq!(page.registry.len(), 1);
}

#[test]
fn invalid_options_are_a_registration_error() {
    let page = Page::new(false);
    let (e, _) = effect(Policy::OneShot, None);
    let err = page
        .registry
        .register(e, anchor("top"), GateOptions::once(2.0))
        .unwrap_err();
    assert!(matches!(err, MotionError::Registration(_)));
    assert!(page.registry.is_empty());
}

#[test]
fn unsupported_gate_starts_effects_immediately() {
    let registry = EffectRegistry::new(
        FrameClock::new(),
        VisibilityGate::always_visible(),
        ReducedMotionPolicy::default(),
    );
    let (e, counts) = effect(Policy::OneShot, Some(16.0));
    let id = registry
        .register(e, anchor("anything"), GateOptions::once(0.5))
        .unwrap();
    assert_eq!(registry.subscriptions_for(id), 1);
    assert_eq!(registry.observations(), 0);
    assert_eq!(registry.gate().observation_count(), 0);
    registry.clock().frame(0.0);
    registry.clock().frame(16.0);
    assert_eq!(counts.borrow().activations, 1);
    assert!(registry.is_empty());
}

#[test]
fn teardown_releases_all_subscriptions_and_observations() {
    let page = Page::new(false);
    let mut all = Vec::new();
    for (policy, at) in [
        (Policy::Continuous, "top"),
        (Policy::Continuous, "below"),
        (Policy::OneShot, "top"),
        (Policy::OneShot, "below"),
    ] {
        let (e, counts) = effect(policy, None);
        page.registry
            .register(e, anchor(at), default_gate_options(policy))
            .unwrap();
        all.push(counts);
    }
    page.refresh();
    assert_eq!(page.registry.active_subscriptions(), 2);

    assert_eq!(page.registry.teardown(), 4);
    assert_eq!(page.registry.clock().subscriber_count(), 0);
    assert_eq!(page.registry.gate().observation_count(), 0);
    assert_eq!(page.observer.watched_count(), 0);
    for counts in all {
        let c = counts.borrow();
        assert_eq!(c.activations, c.deactivations);
    }
}

#[test]
fn unregister_is_idempotent() {
    let page = Page::new(false);
    let (e, _) = effect(Policy::Continuous, None);
    let id = page
        .registry
        .register(e, anchor("top"), GateOptions::continuous(0.0))
        .unwrap();
    page.refresh();
    assert!(page.registry.unregister(id));
    assert!(!page.registry.unregister(id));
    assert_eq!(page.registry.clock().subscriber_count(), 0);
}

#[test]
fn dropping_registry_releases_clock() {
    let clock = FrameClock::new();
    let registry = EffectRegistry::new(
        clock.clone(),
        VisibilityGate::always_visible(),
        ReducedMotionPolicy::default(),
    );
    let (e, counts) = effect(Policy::Continuous, None);
    registry
        .register(e, anchor("a"), GateOptions::continuous(0.0))
        .unwrap();
    assert_eq!(clock.subscriber_count(), 1);
    drop(registry);
    assert_eq!(clock.subscriber_count(), 0);
    assert_eq!(counts.borrow().deactivations, 1);
}

#[test]
fn stats_track_lifecycle() {
    let page = Page::new(false);
    let (e, _) = effect(Policy::Continuous, None);
    let id = page
        .registry
        .register(e, anchor("top"), GateOptions::continuous(0.0))
        .unwrap();
    page.refresh();
    page.registry.clock().frame(0.0);
    let stats = page.registry.stats(id).unwrap();
    assert_eq!(stats.phase, Phase::Active);
    assert_eq!(stats.ticks, 1);
}

#[test]
fn elapsed_starts_at_entry_time_reported_by_driver() {
    let mut layout = AnchorLayout::new();
    layout.place(anchor("below"), Rect::new(0.0, 2000.0, 800.0, 2400.0));
    let observer = Rc::new(GeometryObserver::new(
        layout,
        Viewport::new(Size::new(1280.0, 800.0)),
    ));
    let gate = VisibilityGate::new(observer.clone());
    let driver = Rc::new(crate::clock::frame_clock::ManualDriver::default());
    let clock = FrameClock::with_driver(driver.clone());
    let registry = EffectRegistry::new(
        clock.clone(),
        gate.clone(),
        ReducedMotionPolicy::new(false),
    );
    let (e, counts) = effect(Policy::Continuous, None);
    registry
        .register(e, anchor("below"), GateOptions::continuous(0.0))
        .unwrap();

    driver.set_now(1000.0);
    observer.scroll_to(1800.0);
    observer.refresh(&gate);
    clock.frame(1016.0);
    clock.frame(1032.0);

    assert_eq!(counts.borrow().ticks, vec![16.0, 32.0]);
}
