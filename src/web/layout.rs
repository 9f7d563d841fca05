use crate::{
    foundation::core::{AnchorId, Rect, Size},
    gate::geometry::LayoutSource,
};

/// [`LayoutSource`] over the live DOM: anchors resolve to elements by id and are
/// measured with `getBoundingClientRect`.
pub struct DomLayout {
    window: web_sys::Window,
    document: web_sys::Document,
}

impl DomLayout {
    /// Layout measuring elements of `document` against `window`'s viewport.
    pub fn new(window: web_sys::Window, document: web_sys::Document) -> Self {
        Self { window, document }
    }
}

impl LayoutSource for DomLayout {
    fn client_rect(&self, anchor: &AnchorId) -> Option<Rect> {
        let r = self
            .document
            .get_element_by_id(anchor.as_str())?
            .get_bounding_client_rect();
        Some(Rect::new(r.left(), r.top(), r.right(), r.bottom()))
    }

    fn viewport_size(&self) -> Size {
        let dim = |v: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
            v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
        };
        Size::new(dim(self.window.inner_width()), dim(self.window.inner_height()))
    }
}
