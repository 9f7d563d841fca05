use super::*;

#[test]
fn zero_delay_reveals_on_first_frame() {
    let mut r = RevealEffect::new(0.0).unwrap();
    assert_eq!(r.tick(0.0).unwrap(), Tick::Done);
    assert!(r.revealed().get());
}

#[test]
fn waits_for_delay() {
    let mut r = RevealEffect::new(150.0).unwrap();
    let flag = r.revealed();
    assert_eq!(r.tick(100.0).unwrap(), Tick::Continue);
    assert!(!flag.get());
    assert_eq!(r.tick(160.0).unwrap(), Tick::Done);
    assert!(flag.get());
}

#[test]
fn finish_reveals_immediately() {
    let mut r = RevealEffect::new(5000.0).unwrap();
    r.finish();
    assert_eq!(r.snapshot()["revealed"], true);
}

#[test]
fn negative_delay_is_rejected() {
    assert!(RevealEffect::new(-1.0).is_err());
}
