use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MotionError::registration("x")
            .to_string()
            .contains("registration error:")
    );
    assert!(MotionError::tick("x").to_string().contains("tick error:"));
    assert!(MotionError::gate("x").to_string().contains("gate error:"));
    assert!(
        MotionError::config("x")
            .to_string()
            .contains("config error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MotionError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
