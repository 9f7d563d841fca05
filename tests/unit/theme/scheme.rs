use super::*;

struct FailingStore;

impl ThemeStore for FailingStore {
    fn load(&self) -> MotionResult<Option<Theme>> {
        Err(MotionError::Other(anyhow::anyhow!("storage disabled")))
    }

    fn save(&self, _theme: Theme) -> MotionResult<()> {
        Err(MotionError::Other(anyhow::anyhow!("quota exceeded")))
    }
}

#[test]
fn restore_defaults_to_dark() {
    let ctl = ThemeController::restore(MemoryThemeStore::default());
    assert_eq!(ctl.theme(), Theme::Dark);
}

#[test]
fn restore_uses_saved_value_and_ignores_garbage() {
    let ctl = ThemeController::restore(MemoryThemeStore::with_raw("light"));
    assert_eq!(ctl.theme(), Theme::Light);

    let ctl = ThemeController::restore(MemoryThemeStore::with_raw("sepia"));
    assert_eq!(ctl.theme(), Theme::Dark);
}

#[test]
fn toggle_persists_and_updates_shared_cell() {
    let ctl = ThemeController::restore(MemoryThemeStore::default());
    let shared = ctl.shared();
    assert_eq!(ctl.toggle(), Theme::Light);
    assert_eq!(shared.get(), Theme::Light);
    assert_eq!(ctl.store().raw().as_deref(), Some("light"));
    assert_eq!(ctl.toggle(), Theme::Dark);
    assert_eq!(ctl.store().raw().as_deref(), Some("dark"));
}

#[test]
fn failing_store_still_switches() {
    let ctl = ThemeController::restore(FailingStore);
    assert_eq!(ctl.theme(), Theme::Dark);
    assert_eq!(ctl.toggle(), Theme::Light);
}

#[test]
fn palettes_and_meta_colors_differ_by_theme() {
    assert_ne!(Theme::Dark.blob_palette(), Theme::Light.blob_palette());
    assert_eq!(Theme::Light.meta_color(), "#f5f5f0");
    assert_eq!(
        Theme::Dark.blob_palette()[0].to_string(),
        "rgba(212,168,83,0.025)"
    );
}

#[test]
fn theme_text_round_trips_through_serde() {
    let t: Theme = serde_json::from_str("\"light\"").unwrap();
    assert_eq!(t, Theme::Light);
    assert!("blue".parse::<Theme>().is_err());
}
