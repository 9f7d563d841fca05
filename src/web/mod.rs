//! Browser bindings: `requestAnimationFrame`, `IntersectionObserver`,
//! `getBoundingClientRect`, `matchMedia` and `localStorage` plugged into the platform
//! seams of the core, plus the DOM listeners feeding pointer and page visibility.

/// Frame driver over `requestAnimationFrame`.
pub(crate) mod driver;
/// Observer backend over `IntersectionObserver`.
pub(crate) mod intersection;
/// Layout source over `getBoundingClientRect`.
pub(crate) mod layout;
/// Page-level wiring.
pub(crate) mod runtime;
/// Reduced-motion media query and theme persistence.
pub(crate) mod storage;

use wasm_bindgen::JsValue;

use crate::foundation::error::MotionError;

pub(crate) fn js_error(context: &str, err: JsValue) -> MotionError {
    MotionError::Other(anyhow::anyhow!("{context}: {err:?}"))
}

pub(crate) fn window() -> Result<web_sys::Window, MotionError> {
    web_sys::window().ok_or_else(|| MotionError::Other(anyhow::anyhow!("no global window")))
}
