use std::{cell::RefCell, collections::BTreeMap};

use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use web_sys::{IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use crate::{
    foundation::{
        core::AnchorId,
        error::{MotionError, MotionResult},
    },
    gate::{
        options::GateOptions,
        visibility::{IntersectionSample, ObservationHandle, ObserverBackend, VisibilityGate},
    },
};

type EntriesCallback = Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>;

/// [`ObserverBackend`] over `IntersectionObserver`, one observer per observation.
/// Anchors resolve to elements by id.
pub struct IntersectionBackend {
    document: web_sys::Document,
    observers: RefCell<BTreeMap<ObservationHandle, (IntersectionObserver, EntriesCallback)>>,
}

impl IntersectionBackend {
    /// Backend resolving anchors in `document`.
    pub fn new(document: web_sys::Document) -> Self {
        Self {
            document,
            observers: RefCell::new(BTreeMap::new()),
        }
    }

    /// Whether the browser provides `IntersectionObserver`.
    pub fn is_available(window: &web_sys::Window) -> bool {
        js_sys::Reflect::has(window, &JsValue::from_str("IntersectionObserver")).unwrap_or(false)
    }
}

impl ObserverBackend for IntersectionBackend {
    fn watch(
        &self,
        gate: &VisibilityGate,
        handle: ObservationHandle,
        anchor: &AnchorId,
        options: &GateOptions,
    ) -> MotionResult<()> {
        let element = self
            .document
            .get_element_by_id(anchor.as_str())
            .ok_or_else(|| MotionError::registration(format!("no element with id '{anchor}'")))?;

        let weak = gate.downgrade();
        let callback: EntriesCallback = Closure::new(
            move |entries: js_sys::Array, _observer: IntersectionObserver| {
                let Some(gate) = weak.upgrade() else {
                    return;
                };
                let samples: Vec<IntersectionSample> = entries
                    .iter()
                    .filter_map(|e| e.dyn_into::<IntersectionObserverEntry>().ok())
                    .map(|entry| IntersectionSample {
                        handle,
                        ratio: entry.intersection_ratio(),
                        intersecting: entry.is_intersecting(),
                    })
                    .collect();
                gate.deliver(samples);
            },
        );

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&options.root_margin.to_string());
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)
                .map_err(|e| MotionError::gate(format!("IntersectionObserver rejected: {e:?}")))?;
        observer.observe(&element);
        self.observers
            .borrow_mut()
            .insert(handle, (observer, callback));
        Ok(())
    }

    fn unwatch(&self, handle: ObservationHandle) {
        let removed = self.observers.borrow_mut().remove(&handle);
        if let Some((observer, _callback)) = removed {
            observer.disconnect();
        }
    }
}

impl Drop for IntersectionBackend {
    fn drop(&mut self) {
        for (_, (observer, _)) in std::mem::take(self.observers.get_mut()) {
            observer.disconnect();
        }
    }
}
