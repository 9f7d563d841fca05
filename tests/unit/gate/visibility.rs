use std::cell::Cell;

use super::*;

#[derive(Default)]
struct ScriptedBackend {
    watched: RefCell<Vec<ObservationHandle>>,
    unwatched: RefCell<Vec<ObservationHandle>>,
    missing: Option<&'static str>,
    broken: bool,
}

impl ObserverBackend for ScriptedBackend {
    fn watch(
        &self,
        _gate: &VisibilityGate,
        handle: ObservationHandle,
        anchor: &AnchorId,
        _options: &GateOptions,
    ) -> MotionResult<()> {
        if self.missing == Some(anchor.as_str()) {
            return Err(MotionError::registration("no such anchor"));
        }
        if self.broken {
            return Err(MotionError::gate("observer constructor threw"));
        }
        self.watched.borrow_mut().push(handle);
        Ok(())
    }

    fn unwatch(&self, handle: ObservationHandle) {
        self.unwatched.borrow_mut().push(handle);
    }
}

fn counter() -> (Rc<Cell<u32>>, GateCallback) {
    let n = Rc::new(Cell::new(0));
    let cb = {
        let n = Rc::clone(&n);
        Rc::new(move || n.set(n.get() + 1)) as GateCallback
    };
    (n, cb)
}

fn anchor(id: &str) -> AnchorId {
    AnchorId::new(id).unwrap()
}

fn sample(handle: ObservationHandle, ratio: f64) -> IntersectionSample {
    IntersectionSample {
        handle,
        ratio,
        intersecting: ratio > 0.0,
    }
}

#[test]
fn already_visible_anchor_enters_on_first_sample() {
    let gate = VisibilityGate::new(Rc::new(ScriptedBackend::default()));
    let (enters, on_enter) = counter();
    let h = gate
        .observe(anchor("hero"), GateOptions::once(0.1), on_enter, None)
        .unwrap();
    assert_eq!(enters.get(), 0);
    assert_eq!(gate.record(h), None);

    gate.deliver([sample(h, 1.0)]);
    assert_eq!(enters.get(), 1);
    assert_eq!(
        gate.record(h),
        Some(VisibilityRecord {
            visible: true,
            ratio: 1.0
        })
    );
}

#[test]
fn enter_fires_once_per_entry() {
    let gate = VisibilityGate::new(Rc::new(ScriptedBackend::default()));
    let (enters, on_enter) = counter();
    let (exits, on_exit) = counter();
    let h = gate
        .observe(
            anchor("a"),
            GateOptions::continuous(0.5),
            on_enter,
            Some(on_exit),
        )
        .unwrap();

    gate.deliver([sample(h, 0.2), sample(h, 0.6), sample(h, 0.9), sample(h, 1.0)]);
    assert_eq!((enters.get(), exits.get()), (1, 0));

    gate.deliver([sample(h, 0.3)]);
    assert_eq!((enters.get(), exits.get()), (1, 1));

    gate.deliver([sample(h, 0.7)]);
    assert_eq!((enters.get(), exits.get()), (2, 1));
}

#[test]
fn once_tracking_never_reports_exit() {
    let gate = VisibilityGate::new(Rc::new(ScriptedBackend::default()));
    let (_, on_enter) = counter();
    let (exits, on_exit) = counter();
    let h = gate
        .observe(anchor("a"), GateOptions::once(0.0), on_enter, Some(on_exit))
        .unwrap();
    gate.deliver([sample(h, 0.5), sample(h, 0.0)]);
    assert_eq!(exits.get(), 0);
}

#[test]
fn missing_anchor_is_rejected_without_leaking_observation() {
    let backend = ScriptedBackend {
        missing: Some("ghost"),
        ..ScriptedBackend::default()
    };
    let gate = VisibilityGate::new(Rc::new(backend));
    let (_, on_enter) = counter();
    let err = gate
        .observe(anchor("ghost"), GateOptions::default(), on_enter, None)
        .unwrap_err();
    assert!(matches!(err, MotionError::Registration(_)));
    assert_eq!(gate.observation_count(), 0);
}

#[test]
fn broken_backend_degrades_to_always_visible() {
    let backend = ScriptedBackend {
        broken: true,
        ..ScriptedBackend::default()
    };
    let gate = VisibilityGate::new(Rc::new(backend));
    let (enters, on_enter) = counter();
    let h = gate
        .observe(anchor("a"), GateOptions::once(0.5), on_enter, None)
        .unwrap();
    assert_eq!(enters.get(), 1);
    assert!(gate.record(h).unwrap().visible);
}

#[test]
fn unsupported_gate_enters_immediately() {
    let gate = VisibilityGate::always_visible();
    assert!(!gate.is_supported());
    let (enters, on_enter) = counter();
    gate.observe(anchor("a"), GateOptions::continuous(0.3), on_enter, None)
        .unwrap();
    assert_eq!(enters.get(), 1);
}

#[test]
fn unobserve_is_idempotent_and_releases_backend() {
    let backend = Rc::new(ScriptedBackend::default());
    let gate = VisibilityGate::new(backend.clone());
    let (enters, on_enter) = counter();
    let h = gate
        .observe(anchor("a"), GateOptions::default(), on_enter, None)
        .unwrap();
    assert!(gate.unobserve(h));
    assert!(!gate.unobserve(h));
    assert_eq!(*backend.unwatched.borrow(), vec![h]);

    gate.deliver([sample(h, 1.0)]);
    assert_eq!(enters.get(), 0);
    assert_eq!(gate.observation_count(), 0);
}

#[test]
fn callbacks_may_unobserve_during_delivery() {
    let gate = VisibilityGate::new(Rc::new(ScriptedBackend::default()));
    let slot = Rc::new(Cell::new(None::<ObservationHandle>));
    let on_enter: GateCallback = {
        let gate = gate.downgrade();
        let slot = Rc::clone(&slot);
        Rc::new(move || {
            if let (Some(gate), Some(h)) = (gate.upgrade(), slot.get()) {
                gate.unobserve(h);
            }
        })
    };
    let h = gate
        .observe(anchor("a"), GateOptions::default(), on_enter, None)
        .unwrap();
    slot.set(Some(h));
    gate.deliver([sample(h, 1.0), sample(h, 0.0), sample(h, 1.0)]);
    assert_eq!(gate.observation_count(), 0);
}

#[test]
fn invalid_threshold_is_rejected() {
    let gate = VisibilityGate::always_visible();
    let (_, on_enter) = counter();
    assert!(
        gate.observe(anchor("a"), GateOptions::once(-0.1), on_enter, None)
            .is_err()
    );
}
