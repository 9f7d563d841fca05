use std::{cell::Cell, rc::Rc};

use super::*;
use crate::gate::{options::RootMargin, visibility::GateCallback};

fn anchor(id: &str) -> AnchorId {
    AnchorId::new(id).unwrap()
}

fn page() -> (Rc<GeometryObserver>, VisibilityGate) {
    let mut layout = AnchorLayout::new();
    layout.place(anchor("hero"), Rect::new(0.0, 100.0, 800.0, 500.0));
    layout.place(anchor("stats"), Rect::new(0.0, 1500.0, 800.0, 1700.0));
    let observer = Rc::new(GeometryObserver::new(
        layout,
        Viewport::new(Size::new(1280.0, 800.0)),
    ));
    let gate = VisibilityGate::new(observer.clone());
    (observer, gate)
}

fn counter() -> (Rc<Cell<u32>>, GateCallback) {
    let n = Rc::new(Cell::new(0));
    let cb = {
        let n = Rc::clone(&n);
        Rc::new(move || n.set(n.get() + 1)) as GateCallback
    };
    (n, cb)
}

#[test]
fn intersection_ratio_matches_overlap() {
    let root = Rect::new(0.0, 0.0, 100.0, 100.0);
    assert_eq!(intersection(Rect::new(0.0, 50.0, 100.0, 150.0), root), (true, 0.5));
    assert_eq!(intersection(Rect::new(0.0, 200.0, 10.0, 210.0), root), (false, 0.0));
    assert_eq!(intersection(Rect::new(0.0, 100.0, 10.0, 110.0), root), (true, 0.0));
    assert_eq!(intersection(Rect::new(5.0, 5.0, 5.0, 5.0), root), (true, 1.0));
}

#[test]
fn refresh_reports_on_screen_anchor_on_first_pass() {
    let (observer, gate) = page();
    let (enters, on_enter) = counter();
    gate.observe(anchor("hero"), GateOptions::once(0.1), on_enter, None)
        .unwrap();
    observer.refresh(&gate);
    assert_eq!(enters.get(), 1);
}

#[test]
fn scrolling_drives_enter_and_exit() {
    let (observer, gate) = page();
    let (enters, on_enter) = counter();
    let (exits, on_exit) = counter();
    let h = gate
        .observe(
            anchor("stats"),
            GateOptions::continuous(0.5),
            on_enter,
            Some(on_exit),
        )
        .unwrap();

    observer.refresh(&gate);
    assert_eq!(enters.get(), 0);
    assert!(!gate.record(h).unwrap().visible);

    observer.scroll_to(800.0); // stats half visible: 1500..1600 of 1500..1700
    observer.refresh(&gate);
    assert_eq!(enters.get(), 1);
    assert_eq!(gate.record(h).unwrap().ratio, 0.5);

    observer.scroll_to(0.0);
    observer.refresh(&gate);
    assert_eq!(exits.get(), 1);
}

#[test]
fn root_margin_shrinks_the_root() {
    let (observer, gate) = page();
    let (enters, on_enter) = counter();
    let margin: RootMargin = "0px 0px -150px 0px".parse().unwrap();
    gate.observe(
        anchor("stats"),
        GateOptions::once(0.0).with_root_margin(margin),
        on_enter,
        None,
    )
    .unwrap();

    // Viewport bottom at 1600 but the shrunk root ends at 1450.
    observer.scroll_to(800.0);
    observer.refresh(&gate);
    assert_eq!(enters.get(), 0);

    observer.scroll_to(1000.0);
    observer.refresh(&gate);
    assert_eq!(enters.get(), 1);
}

#[test]
fn unknown_anchor_fails_registration() {
    let (_observer, gate) = page();
    let (_, on_enter) = counter();
    let err = gate
        .observe(anchor("nope"), GateOptions::default(), on_enter, None)
        .unwrap_err();
    assert!(matches!(err, MotionError::Registration(_)));
}

#[test]
fn unobserve_stops_watching() {
    let (observer, gate) = page();
    let (_, on_enter) = counter();
    let h = gate
        .observe(anchor("hero"), GateOptions::default(), on_enter, None)
        .unwrap();
    assert_eq!(observer.watched_count(), 1);
    gate.unobserve(h);
    assert_eq!(observer.watched_count(), 0);
}

#[test]
fn layout_source_reports_client_rect() {
    let (observer, _gate) = page();
    observer.scroll_to(1000.0);
    let r = observer.client_rect(&anchor("stats")).unwrap();
    assert_eq!(r, Rect::new(0.0, 500.0, 800.0, 700.0));
    assert_eq!(observer.viewport_size(), Size::new(1280.0, 800.0));
}
