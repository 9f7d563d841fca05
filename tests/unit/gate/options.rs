use super::*;

#[test]
fn shorthand_expands_like_css() {
    let m: RootMargin = "0px 0px -60px 0px".parse().unwrap();
    assert_eq!(m.bottom, MarginLength::Px(-60.0));
    assert_eq!(m.top, MarginLength::Px(0.0));

    let m: RootMargin = "-72px 0px -40% 0px".parse().unwrap();
    assert_eq!(m.top, MarginLength::Px(-72.0));
    assert_eq!(m.bottom, MarginLength::Percent(-40.0));

    let m: RootMargin = "10px 5%".parse().unwrap();
    assert_eq!(m.left, MarginLength::Percent(5.0));
    assert_eq!(m.bottom, MarginLength::Px(10.0));

    let m: RootMargin = "0".parse().unwrap();
    assert_eq!(m, RootMargin::default());
}

#[test]
fn bad_margins_are_config_errors() {
    for bad in ["", "10em", "1px 2px 3px 4px 5px", "abc%"] {
        let err = bad.parse::<RootMargin>().unwrap_err();
        assert!(matches!(err, MotionError::Config(_)), "{bad}");
    }
}

#[test]
fn expand_resolves_percent_against_axis() {
    let m: RootMargin = "-72px 0px -40% 0px".parse().unwrap();
    let r = m.expand(Rect::new(0.0, 0.0, 1000.0, 800.0));
    assert_eq!(r, Rect::new(0.0, 72.0, 1000.0, 480.0));
}

#[test]
fn margin_serde_uses_css_text() {
    let opts: GateOptions =
        serde_json::from_str(r#"{"threshold":0.1,"root_margin":"0px 0px -60px 0px"}"#).unwrap();
    assert_eq!(opts.tracking, Tracking::Once);
    let back = serde_json::to_value(opts).unwrap();
    assert_eq!(back["root_margin"], "0px 0px -60px 0px");
}

#[test]
fn passes_respects_threshold_and_zero_case() {
    let any = GateOptions::once(0.0);
    assert!(any.passes(0.0, true));
    assert!(!any.passes(0.0, false));

    let half = GateOptions::once(0.5);
    assert!(!half.passes(0.49, true));
    assert!(half.passes(0.5, true));
}

#[test]
fn validate_rejects_out_of_range_threshold() {
    assert!(GateOptions::once(1.5).validate().is_err());
    assert!(GateOptions::continuous(1.0).validate().is_ok());
}
