use super::*;

#[test]
fn counts_up_with_out_cubic() {
    let c = CounterEffect::new(1200, 2000.0).unwrap();
    assert_eq!(c.value_at(0.0), 0);
    assert_eq!(c.value_at(1000.0), 1050); // 1 - 0.5^3 = 0.875
    assert_eq!(c.value_at(2000.0), 1200);
    assert_eq!(c.value_at(9000.0), 1200);
}

#[test]
fn tick_reports_done_at_duration() {
    let mut c = CounterEffect::new(50, 100.0).unwrap();
    let display = c.display();
    assert_eq!(c.tick(50.0).unwrap(), Tick::Continue);
    assert!(display.get() > 25);
    assert_eq!(c.tick(100.0).unwrap(), Tick::Done);
    assert_eq!(display.get(), 50);
}

#[test]
fn finish_jumps_to_target() {
    let mut c = CounterEffect::new(-40, 100.0).unwrap();
    c.finish();
    assert_eq!(c.display().get(), -40);
    assert_eq!(c.snapshot()["value"], -40);
}

#[test]
fn rejects_non_positive_duration() {
    assert!(CounterEffect::new(1, 0.0).is_err());
    assert!(CounterEffect::new(1, f64::NAN).is_err());
}

#[test]
fn linear_ease_is_proportional() {
    let c = CounterEffect::new(100, 1000.0).unwrap().with_ease(Ease::Linear);
    assert_eq!(c.value_at(250.0), 25);
}
