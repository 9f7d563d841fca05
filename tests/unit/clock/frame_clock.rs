use super::*;

fn recorder(log: &Rc<RefCell<Vec<(u32, f64)>>>, tag: u32) -> FrameCallback {
    let log = Rc::clone(log);
    Box::new(move |ts| {
        log.borrow_mut().push((tag, ts));
        Ok(())
    })
}

#[test]
fn delivers_in_subscription_order() {
    let clock = FrameClock::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    clock.subscribe(recorder(&log, 1));
    clock.subscribe(recorder(&log, 2));
    clock.subscribe(recorder(&log, 3));

    let report = clock.frame(16.0);
    assert_eq!(report.delivered, 3);
    assert_eq!(*log.borrow(), vec![(1, 16.0), (2, 16.0), (3, 16.0)]);
}

#[test]
fn unsubscribe_is_idempotent() {
    let clock = FrameClock::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let id = clock.subscribe(recorder(&log, 1));
    assert!(clock.unsubscribe(id));
    assert!(!clock.unsubscribe(id));
    clock.frame(1.0);
    assert!(log.borrow().is_empty());
    assert_eq!(clock.subscriber_count(), 0);
}

#[test]
fn timestamps_never_go_backwards() {
    let clock = FrameClock::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    clock.subscribe(recorder(&log, 1));
    clock.frame(100.0);
    clock.frame(90.0);
    clock.frame(f64::NAN);
    clock.frame(116.0);
    let stamps: Vec<f64> = log.borrow().iter().map(|(_, ts)| *ts).collect();
    assert_eq!(stamps, vec![100.0, 100.0, 100.0, 116.0]);
}

#[test]
fn self_unsubscribe_does_not_skip_neighbours() {
    let clock = FrameClock::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let own_id = Rc::new(Cell::new(None::<SubscriptionId>));

    clock.subscribe(recorder(&log, 1));
    let id = {
        let clock_in = clock.clone();
        let own_id = Rc::clone(&own_id);
        let log = Rc::clone(&log);
        clock.subscribe(Box::new(move |ts| {
            log.borrow_mut().push((2, ts));
            if let Some(id) = own_id.get() {
                clock_in.unsubscribe(id);
            }
            Ok(())
        }))
    };
    own_id.set(Some(id));
    clock.subscribe(recorder(&log, 3));

    clock.frame(1.0);
    clock.frame(2.0);
    assert_eq!(
        *log.borrow(),
        vec![(1, 1.0), (2, 1.0), (3, 1.0), (1, 2.0), (3, 2.0)]
    );
}

#[test]
fn removal_by_earlier_subscriber_takes_effect_within_frame() {
    let clock = FrameClock::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let victim = Rc::new(Cell::new(None::<SubscriptionId>));
    {
        let clock_in = clock.clone();
        let victim = Rc::clone(&victim);
        clock.subscribe(Box::new(move |_| {
            if let Some(id) = victim.get() {
                clock_in.unsubscribe(id);
            }
            Ok(())
        }));
    }
    victim.set(Some(clock.subscribe(recorder(&log, 2))));
    clock.frame(1.0);
    assert!(log.borrow().is_empty());
}

#[test]
fn subscriber_added_mid_frame_waits_for_next_frame() {
    let clock = FrameClock::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let added = Rc::new(Cell::new(false));
    {
        let clock_in = clock.clone();
        let log = Rc::clone(&log);
        let added = Rc::clone(&added);
        clock.subscribe(Box::new(move |_| {
            if !added.replace(true) {
                clock_in.subscribe(recorder(&log, 9));
            }
            Ok(())
        }));
    }
    clock.frame(1.0);
    assert!(log.borrow().is_empty());
    clock.frame(2.0);
    assert_eq!(*log.borrow(), vec![(9, 2.0)]);
}

#[test]
fn failing_subscriber_is_removed_and_others_continue() {
    let clock = FrameClock::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let bad = clock.subscribe(Box::new(|_| Err(MotionError::tick("bad frame"))));
    clock.subscribe(recorder(&log, 2));

    let report = clock.frame(1.0);
    assert_eq!(report, FrameReport { delivered: 1, failed: 1 });
    assert!(!clock.is_subscribed(bad));

    clock.frame(2.0);
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn panicking_subscriber_is_isolated() {
    let clock = FrameClock::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    clock.subscribe(Box::new(|_| panic!("kaboom")));
    clock.subscribe(recorder(&log, 2));

    let report = clock.frame(1.0);
    assert_eq!(report.failed, 1);
    assert_eq!(clock.subscriber_count(), 1);
    assert_eq!(*log.borrow(), vec![(2, 1.0)]);
}

#[test]
fn driver_is_woken_only_while_subscribers_exist() {
    let driver = Rc::new(ManualDriver::default());
    let clock = FrameClock::with_driver(driver.clone());
    assert_eq!(driver.requests(), 0);

    let id = clock.subscribe(Box::new(|_| Ok(())));
    assert_eq!(driver.requests(), 1);
    let other = clock.subscribe(Box::new(|_| Ok(())));
    assert_eq!(driver.requests(), 1);

    clock.frame(1.0);
    assert_eq!(driver.requests(), 2);

    clock.unsubscribe(id);
    clock.frame(2.0);
    assert_eq!(driver.requests(), 3);

    clock.unsubscribe(other);
    clock.frame(3.0);
    assert_eq!(driver.requests(), 3);
    assert_eq!(clock.frames_delivered(), 3);
}

#[test]
fn weak_handle_does_not_keep_clock_alive() {
    let clock = FrameClock::new();
    let weak = clock.downgrade();
    assert!(weak.upgrade().is_some());
    drop(clock);
    assert!(weak.upgrade().is_none());
}

#[test]
fn suspended_clock_skips_frames_and_stops_requesting() {
    let driver = Rc::new(ManualDriver::default());
    let clock = FrameClock::with_driver(driver.clone());
    let log = Rc::new(RefCell::new(Vec::new()));
    clock.subscribe(recorder(&log, 1));
    assert_eq!(driver.requests(), 1);

    clock.suspend();
    clock.suspend();
    assert!(clock.is_suspended());
    assert_eq!(driver.cancels(), 1);
    assert_eq!(clock.frame(16.0), FrameReport::default());
    clock.subscribe(recorder(&log, 2));
    assert_eq!(driver.requests(), 1);
    assert!(log.borrow().is_empty());
    assert_eq!(clock.frames_delivered(), 0);

    clock.resume();
    assert_eq!(driver.requests(), 2);
    clock.frame(32.0);
    assert_eq!(*log.borrow(), vec![(1, 32.0), (2, 32.0)]);
}

#[test]
fn now_comes_from_the_driver() {
    assert_eq!(FrameClock::new().now_ms(), None);
    let driver = Rc::new(ManualDriver::default());
    let clock = FrameClock::with_driver(driver.clone());
    assert_eq!(clock.now_ms(), None);
    driver.set_now(250.0);
    assert_eq!(clock.now_ms(), Some(250.0));
}
