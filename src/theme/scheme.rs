use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
    str::FromStr,
};

use crate::foundation::error::{MotionError, MotionResult};

/// Storage key under which the active theme is persisted.
pub const THEME_STORAGE_KEY: &str = "wk-theme";

/// Page color scheme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Dark scheme (the default).
    #[default]
    Dark,
    /// Light scheme.
    Light,
}

impl Theme {
    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    /// Value for the `theme-color` metadata.
    pub fn meta_color(self) -> &'static str {
        match self {
            Self::Dark => "#0a0a12",
            Self::Light => "#f5f5f0",
        }
    }

    /// Fill colors for the ambient background blobs.
    pub fn blob_palette(self) -> [Rgba; 4] {
        match self {
            Self::Dark => [
                Rgba::new(212, 168, 83, 0.025),
                Rgba::new(79, 124, 255, 0.018),
                Rgba::new(212, 168, 83, 0.02),
                Rgba::new(150, 130, 200, 0.015),
            ],
            Self::Light => [
                Rgba::new(212, 168, 83, 0.06),
                Rgba::new(79, 124, 255, 0.05),
                Rgba::new(212, 168, 83, 0.04),
                Rgba::new(150, 130, 200, 0.04),
            ],
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dark => "dark",
            Self::Light => "light",
        })
    }
}

impl FromStr for Theme {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            other => Err(MotionError::config(format!("unknown theme '{other}'"))),
        }
    }
}

/// Straight (non-premultiplied) color with fractional alpha, printed as CSS `rgba()`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Rgba {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha in `[0, 1]`.
    pub a: f64,
}

impl Rgba {
    /// Build a color.
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

/// Persistence for the theme preference.
pub trait ThemeStore {
    /// Saved theme, if any. Unreadable values count as absent.
    fn load(&self) -> MotionResult<Option<Theme>>;
    /// Persist `theme`.
    fn save(&self, theme: Theme) -> MotionResult<()>;
}

/// In-process store, as used headless and in tests.
#[derive(Debug, Default)]
pub struct MemoryThemeStore {
    value: RefCell<Option<String>>,
}

impl MemoryThemeStore {
    /// Store pre-seeded with a raw saved value.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            value: RefCell::new(Some(raw.into())),
        }
    }

    /// Raw saved value.
    pub fn raw(&self) -> Option<String> {
        self.value.borrow().clone()
    }
}

impl ThemeStore for MemoryThemeStore {
    fn load(&self) -> MotionResult<Option<Theme>> {
        Ok(self.value.borrow().as_deref().and_then(|raw| raw.parse().ok()))
    }

    fn save(&self, theme: Theme) -> MotionResult<()> {
        *self.value.borrow_mut() = Some(theme.to_string());
        Ok(())
    }
}

/// Owns the active theme and keeps the store in sync.
///
/// Effects read the theme through [`ThemeController::shared`] when they need it.
pub struct ThemeController<S> {
    store: S,
    current: Rc<Cell<Theme>>,
}

impl<S: ThemeStore> ThemeController<S> {
    /// Restore the saved theme from `store`, falling back to [`Theme::Dark`].
    pub fn restore(store: S) -> Self {
        let theme = match store.load() {
            Ok(saved) => saved.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(error = %err, "theme preference unreadable; using default");
                Theme::default()
            }
        };
        Self {
            store,
            current: Rc::new(Cell::new(theme)),
        }
    }

    /// Active theme.
    pub fn theme(&self) -> Theme {
        self.current.get()
    }

    /// Shared cell effects can read at activation or tick time.
    pub fn shared(&self) -> Rc<Cell<Theme>> {
        Rc::clone(&self.current)
    }

    /// Switch to `theme` and persist it. Persistence failures are logged; the switch
    /// still takes effect.
    pub fn apply(&self, theme: Theme) {
        self.current.set(theme);
        if let Err(err) = self.store.save(theme) {
            tracing::warn!(error = %err, %theme, "could not persist theme");
        }
    }

    /// Flip between dark and light; returns the new theme.
    pub fn toggle(&self) -> Theme {
        let next = self.theme().toggled();
        self.apply(next);
        next
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
#[path = "../../tests/unit/theme/scheme.rs"]
mod tests;
