use crate::{
    foundation::error::{MotionError, MotionResult},
    motion::policy::MotionPreferenceSource,
    theme::scheme::{THEME_STORAGE_KEY, Theme, ThemeStore},
};

use super::{js_error, window};

/// Media query matched by users who asked for less motion.
pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// Reads [`REDUCED_MOTION_QUERY`] through `matchMedia`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MediaQueryPreference;

impl MotionPreferenceSource for MediaQueryPreference {
    fn prefers_reduced_motion(&self) -> MotionResult<bool> {
        let list = window()?
            .match_media(REDUCED_MOTION_QUERY)
            .map_err(|e| js_error("matchMedia", e))?
            .ok_or_else(|| MotionError::Other(anyhow::anyhow!("matchMedia returned null")))?;
        Ok(list.matches())
    }
}

/// Theme persisted in `localStorage` under [`THEME_STORAGE_KEY`].
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorageThemeStore;

impl LocalStorageThemeStore {
    fn storage(&self) -> MotionResult<web_sys::Storage> {
        window()?
            .local_storage()
            .map_err(|e| js_error("localStorage", e))?
            .ok_or_else(|| MotionError::Other(anyhow::anyhow!("localStorage unavailable")))
    }
}

impl ThemeStore for LocalStorageThemeStore {
    fn load(&self) -> MotionResult<Option<Theme>> {
        let raw = self
            .storage()?
            .get_item(THEME_STORAGE_KEY)
            .map_err(|e| js_error("localStorage.getItem", e))?;
        Ok(raw.and_then(|v| v.parse().ok()))
    }

    fn save(&self, theme: Theme) -> MotionResult<()> {
        self.storage()?
            .set_item(THEME_STORAGE_KEY, &theme.to_string())
            .map_err(|e| js_error("localStorage.setItem", e))
    }
}
