use std::{cell::Cell, rc::Rc};

use wasm_bindgen::{JsCast, closure::Closure};

use crate::{
    clock::frame_clock::{FrameClock, FrameDriver},
    foundation::error::MotionResult,
};

/// Schedules [`FrameClock::frame`] through `requestAnimationFrame`.
///
/// Requests made while one is pending collapse into it. The callback holds the clock
/// weakly, so dropping the clock stops delivery.
pub struct AnimationFrameDriver {
    window: web_sys::Window,
    pending: Rc<Cell<Option<i32>>>,
    callback: Closure<dyn FnMut(f64)>,
}

impl AnimationFrameDriver {
    /// Create a driver and install it on `clock`.
    pub fn attach(clock: &FrameClock) -> MotionResult<Rc<Self>> {
        let window = super::window()?;
        let pending: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
        let weak = clock.downgrade();
        let flag = Rc::clone(&pending);
        let callback = Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
            flag.set(None);
            if let Some(clock) = weak.upgrade() {
                clock.frame(timestamp);
            }
        });
        let driver = Rc::new(Self {
            window,
            pending,
            callback,
        });
        clock.set_driver(driver.clone());
        Ok(driver)
    }

    /// Whether a frame is currently requested.
    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }
}

impl FrameDriver for AnimationFrameDriver {
    fn request_frame(&self) {
        if self.is_pending() {
            return;
        }
        match self
            .window
            .request_animation_frame(self.callback.as_ref().unchecked_ref())
        {
            Ok(id) => self.pending.set(Some(id)),
            Err(err) => tracing::warn!(error = ?err, "requestAnimationFrame failed"),
        }
    }

    fn cancel_frame(&self) {
        if let Some(id) = self.pending.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
    }

    fn now_ms(&self) -> Option<f64> {
        self.window.performance().map(|p| p.now())
    }
}

impl Drop for AnimationFrameDriver {
    fn drop(&mut self) {
        self.cancel_frame();
    }
}
