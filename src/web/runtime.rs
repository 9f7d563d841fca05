use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use wasm_bindgen::{JsCast, JsValue, closure::Closure};

use crate::{
    clock::frame_clock::FrameClock,
    effect::handle::EffectHandle,
    effects::flow_mask::EdgeMask,
    foundation::{
        core::Point,
        error::{MotionError, MotionResult},
    },
    gate::{geometry::LayoutSource, visibility::VisibilityGate},
    motion::policy::ReducedMotionPolicy,
    page::{
        build::{Assembled, EffectInputs},
        config::EffectSpec,
    },
    registry::binding::{EffectId, EffectRegistry},
    theme::scheme::{Theme, ThemeController},
};

use super::{
    driver::AnimationFrameDriver,
    intersection::IntersectionBackend,
    js_error,
    layout::DomLayout,
    storage::{LocalStorageThemeStore, MediaQueryPreference},
    window,
};

type EventCallback = Closure<dyn FnMut(web_sys::Event)>;

struct Listener {
    target: web_sys::EventTarget,
    event: &'static str,
    callback: EventCallback,
}

/// A built-in effect registered through [`BrowserRuntime::register`].
pub struct RegisteredEffect {
    /// Registry id.
    pub id: EffectId,
    /// Handle for reading the effect's state.
    pub handle: Rc<RefCell<EffectHandle>>,
}

/// Everything a page needs to register effects in the browser.
pub struct BrowserRuntime {
    window: web_sys::Window,
    document: web_sys::Document,
    registry: EffectRegistry,
    driver: Rc<AnimationFrameDriver>,
    theme: ThemeController<LocalStorageThemeStore>,
    layout: Rc<DomLayout>,
    pointer: Rc<Cell<Option<Point>>>,
    listeners: RefCell<Vec<Listener>>,
}

impl BrowserRuntime {
    /// Detect reduced motion, restore the saved theme, and wire a registry to
    /// `requestAnimationFrame` and `IntersectionObserver`. Without
    /// `IntersectionObserver` every anchor counts as visible.
    ///
    /// Pointer moves feed the shared pointer cell, and the clock is suspended while
    /// the page is hidden.
    pub fn install() -> MotionResult<Self> {
        let window = window()?;
        let document = window
            .document()
            .ok_or_else(|| MotionError::Other(anyhow::anyhow!("window has no document")))?;

        let motion = ReducedMotionPolicy::detect(&MediaQueryPreference);
        let clock = FrameClock::new();
        let driver = AnimationFrameDriver::attach(&clock)?;
        let gate = if IntersectionBackend::is_available(&window) {
            VisibilityGate::new(Rc::new(IntersectionBackend::new(document.clone())))
        } else {
            tracing::warn!("IntersectionObserver unsupported; effects start immediately");
            VisibilityGate::always_visible()
        };
        let registry = EffectRegistry::new(clock, gate, motion);
        let theme = ThemeController::restore(LocalStorageThemeStore);
        let layout = Rc::new(DomLayout::new(window.clone(), document.clone()));

        let runtime = Self {
            window,
            document,
            registry,
            driver,
            theme,
            layout,
            pointer: Rc::new(Cell::new(None)),
            listeners: RefCell::new(Vec::new()),
        };
        runtime.apply_theme_to_document()?;
        runtime.listen_pointer()?;
        runtime.listen_page_visibility()?;
        tracing::debug!(reduced = motion.is_reduced(), "browser runtime installed");
        Ok(runtime)
    }

    /// Registry effects are registered on.
    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    /// Theme state.
    pub fn theme(&self) -> &ThemeController<LocalStorageThemeStore> {
        &self.theme
    }

    /// Shared pointer position, client pixels.
    pub fn pointer(&self) -> Rc<Cell<Option<Point>>> {
        Rc::clone(&self.pointer)
    }

    /// Whether the device reports touch input.
    pub fn is_touch(&self) -> bool {
        js_sys::Reflect::has(&self.window, &JsValue::from_str("ontouchstart")).unwrap_or(false)
    }

    /// Inputs for building built-in effects against the live page.
    pub fn inputs(&self) -> EffectInputs {
        EffectInputs {
            layout: self.layout.clone(),
            theme: self.theme.shared(),
            pointer: Rc::clone(&self.pointer),
            viewport_width: self.layout.viewport_size().width,
            touch: self.is_touch(),
        }
    }

    /// Build and register a built-in effect. `Ok(None)` when the effect is left out on
    /// this device.
    pub fn register(&self, spec: &EffectSpec) -> MotionResult<Option<RegisteredEffect>> {
        let effect = match spec.build(&self.inputs())? {
            Assembled::Ready(effect) => effect,
            Assembled::Skipped(reason) => {
                tracing::debug!(kind = spec.kind.label(), anchor = %spec.anchor, %reason, "effect left out");
                return Ok(None);
            }
        };
        let handle = Rc::new(RefCell::new(EffectHandle::new(effect)));
        let id = self.registry.register_shared(
            Rc::clone(&handle),
            spec.anchor.clone(),
            spec.gate_options(),
        )?;
        Ok(Some(RegisteredEffect { id, handle }))
    }

    /// Register every effect, skipping the ones that fail. Returns how many registered.
    pub fn register_all(&self, specs: &[EffectSpec]) -> usize {
        specs
            .iter()
            .filter(|spec| match self.register(spec) {
                Ok(registered) => registered.is_some(),
                Err(err) => {
                    tracing::warn!(kind = spec.kind.label(), anchor = %spec.anchor, error = %err, "effect not registered");
                    false
                }
            })
            .count()
    }

    /// Keep an [`EdgeMask`] on the horizontally scrolling element `id` in step with its
    /// scroll position and the window size.
    pub fn watch_flow_scroll(&self, id: &str) -> MotionResult<()> {
        let element: web_sys::HtmlElement = self
            .document
            .get_element_by_id(id)
            .ok_or_else(|| MotionError::registration(format!("no element with id '{id}'")))?
            .dyn_into()
            .map_err(|_| MotionError::registration(format!("'{id}' is not an HTML element")))?;

        let update = {
            let element = element.clone();
            move || {
                let mask = EdgeMask::for_scroll(
                    f64::from(element.scroll_left()),
                    f64::from(element.scroll_width()),
                    f64::from(element.client_width()),
                );
                let style = element.style();
                for property in ["mask-image", "-webkit-mask-image"] {
                    if let Err(err) = style.set_property(property, mask.css()) {
                        tracing::warn!(error = ?err, property, "edge mask not applied");
                    }
                }
            }
        };
        update();
        let on_scroll = update.clone();
        self.listen(element.into(), "scroll", move |_| on_scroll())?;
        self.listen(self.window.clone().into(), "resize", move |_| update())
    }

    /// Flip the theme, persist it, and update the document.
    pub fn toggle_theme(&self) -> MotionResult<Theme> {
        let theme = self.theme.toggle();
        self.apply_theme_to_document()?;
        Ok(theme)
    }

    /// Whether a frame is pending with the browser.
    pub fn frame_pending(&self) -> bool {
        self.driver.is_pending()
    }

    /// Release every effect's subscription and observation, and remove the DOM
    /// listeners.
    pub fn teardown(&self) -> usize {
        for l in self.listeners.borrow_mut().drain(..) {
            let _ = l
                .target
                .remove_event_listener_with_callback(l.event, l.callback.as_ref().unchecked_ref());
        }
        self.registry.teardown()
    }

    fn listen(
        &self,
        target: web_sys::EventTarget,
        event: &'static str,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) -> MotionResult<()> {
        let callback: EventCallback = Closure::new(handler);
        target
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .map_err(|e| js_error(event, e))?;
        self.listeners.borrow_mut().push(Listener {
            target,
            event,
            callback,
        });
        Ok(())
    }

    fn listen_pointer(&self) -> MotionResult<()> {
        let target: web_sys::EventTarget = self.document.clone().into();
        let pointer = Rc::clone(&self.pointer);
        self.listen(target.clone(), "mousemove", move |event| {
            if let Some(e) = event.dyn_ref::<web_sys::MouseEvent>() {
                pointer.set(Some(Point::new(
                    f64::from(e.client_x()),
                    f64::from(e.client_y()),
                )));
            }
        })?;
        let pointer = Rc::clone(&self.pointer);
        self.listen(target, "mouseleave", move |_| pointer.set(None))
    }

    fn listen_page_visibility(&self) -> MotionResult<()> {
        let clock = self.registry.clock().downgrade();
        let document = self.document.clone();
        self.listen(self.document.clone().into(), "visibilitychange", move |_| {
            let Some(clock) = clock.upgrade() else {
                return;
            };
            if document.hidden() {
                clock.suspend();
            } else {
                clock.resume();
            }
        })
    }

    fn apply_theme_to_document(&self) -> MotionResult<()> {
        let theme = self.theme.theme();
        if let Some(root) = self.document.document_element() {
            root.set_attribute("data-theme", &theme.to_string())
                .map_err(|e| js_error("set data-theme", e))?;
        }
        let meta = self
            .document
            .query_selector("meta[name=\"theme-color\"]")
            .map_err(|e| js_error("query theme-color", e))?;
        if let Some(meta) = meta {
            meta.set_attribute("content", theme.meta_color())
                .map_err(|e| js_error("set theme-color", e))?;
        }
        Ok(())
    }
}

impl Drop for BrowserRuntime {
    fn drop(&mut self) {
        self.teardown();
    }
}
