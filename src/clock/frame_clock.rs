//! Shared per-frame tick source.
//!
//! A [`FrameClock`] multiplexes one platform frame callback across any number of
//! subscribers. The platform side only sees a [`FrameDriver`]: the clock asks it for a
//! frame whenever at least one subscriber exists and stops asking once the list drains.

use std::{
    cell::{Cell, RefCell},
    panic::{AssertUnwindSafe, catch_unwind},
    rc::{Rc, Weak},
};

use crate::foundation::error::{MotionError, MotionResult};

/// Identifier for one live frame subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

/// Per-frame callback; receives the frame timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnMut(f64) -> MotionResult<()>>;

/// Platform hook that schedules the next frame delivery.
pub trait FrameDriver {
    /// Ask the platform to call [`FrameClock::frame`] once more. Repeated requests
    /// before that frame arrives must collapse into one.
    fn request_frame(&self);

    /// Drop a frame requested earlier but not yet delivered.
    fn cancel_frame(&self) {}

    /// Current time on the same timeline as frame timestamps, if the platform has one.
    fn now_ms(&self) -> Option<f64> {
        None
    }
}

/// Driver for headless use: records requests and leaves frame delivery to the caller.
#[derive(Debug, Default)]
pub struct ManualDriver {
    requests: Cell<u64>,
    cancels: Cell<u64>,
    now: Cell<Option<f64>>,
}

impl ManualDriver {
    /// Number of frame requests received so far.
    pub fn requests(&self) -> u64 {
        self.requests.get()
    }

    /// Number of cancellations received so far.
    pub fn cancels(&self) -> u64 {
        self.cancels.get()
    }

    /// Set the time reported by [`FrameDriver::now_ms`].
    pub fn set_now(&self, now_ms: f64) {
        self.now.set(Some(now_ms));
    }
}

impl FrameDriver for ManualDriver {
    fn request_frame(&self) {
        self.requests.set(self.requests.get() + 1);
    }

    fn cancel_frame(&self) {
        self.cancels.set(self.cancels.get() + 1);
    }

    fn now_ms(&self) -> Option<f64> {
        self.now.get()
    }
}

/// Outcome of delivering one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Subscribers invoked successfully.
    pub delivered: usize,
    /// Subscribers that failed and were removed.
    pub failed: usize,
}

struct Subscriber {
    id: SubscriptionId,
    callback: Rc<RefCell<FrameCallback>>,
}

#[derive(Default)]
struct ClockState {
    next_id: u64,
    subscribers: Vec<Subscriber>,
    last_timestamp: Option<f64>,
    frames: u64,
    suspended: bool,
}

struct ClockInner {
    state: RefCell<ClockState>,
    driver: RefCell<Option<Rc<dyn FrameDriver>>>,
}

/// Cheap-clone handle to a shared frame clock.
#[derive(Clone)]
pub struct FrameClock {
    inner: Rc<ClockInner>,
}

/// Non-owning handle, for platform closures that must not keep the clock alive.
#[derive(Clone)]
pub struct WeakFrameClock {
    inner: Weak<ClockInner>,
}

impl WeakFrameClock {
    /// Recover the clock if it is still alive.
    pub fn upgrade(&self) -> Option<FrameClock> {
        self.inner.upgrade().map(|inner| FrameClock { inner })
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Clock without a driver; frames are delivered only by explicit [`Self::frame`] calls.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ClockInner {
                state: RefCell::new(ClockState::default()),
                driver: RefCell::new(None),
            }),
        }
    }

    /// Clock that wakes `driver` whenever subscribers are waiting for a frame.
    pub fn with_driver(driver: Rc<dyn FrameDriver>) -> Self {
        let clock = Self::new();
        clock.set_driver(driver);
        clock
    }

    /// Install or replace the driver. Wakes it at once if subscribers already exist.
    pub fn set_driver(&self, driver: Rc<dyn FrameDriver>) {
        *self.inner.driver.borrow_mut() = Some(driver);
        if self.subscriber_count() > 0 {
            self.wake();
        }
    }

    /// Downgrade to a non-owning handle.
    pub fn downgrade(&self) -> WeakFrameClock {
        WeakFrameClock {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Register `callback` for the next and all following frames.
    pub fn subscribe(&self, callback: FrameCallback) -> SubscriptionId {
        let (id, was_idle) = {
            let mut state = self.inner.state.borrow_mut();
            let id = SubscriptionId(state.next_id);
            state.next_id += 1;
            let was_idle = state.subscribers.is_empty();
            state.subscribers.push(Subscriber {
                id,
                callback: Rc::new(RefCell::new(callback)),
            });
            (id, was_idle)
        };
        tracing::debug!(subscription = id.0, "frame subscription added");
        if was_idle {
            self.wake();
        }
        id
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.inner.state.borrow_mut();
        let before = state.subscribers.len();
        state.subscribers.retain(|s| s.id != id);
        let removed = state.subscribers.len() != before;
        if removed {
            tracing::debug!(subscription = id.0, "frame subscription removed");
        }
        removed
    }

    /// Whether `id` is still subscribed.
    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.inner
            .state
            .borrow()
            .subscribers
            .iter()
            .any(|s| s.id == id)
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.borrow().subscribers.len()
    }

    /// Number of frames delivered so far.
    pub fn frames_delivered(&self) -> u64 {
        self.inner.state.borrow().frames
    }

    /// Stop delivering frames until [`Self::resume`], e.g. while the page is hidden.
    /// Subscriptions are kept; a pending frame request is cancelled.
    pub fn suspend(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.suspended {
                return;
            }
            state.suspended = true;
        }
        tracing::debug!("frame clock suspended");
        let driver = self.inner.driver.borrow().clone();
        if let Some(driver) = driver {
            driver.cancel_frame();
        }
    }

    /// Undo [`Self::suspend`], asking for a frame if anything is subscribed.
    pub fn resume(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            if !state.suspended {
                return;
            }
            state.suspended = false;
        }
        tracing::debug!("frame clock resumed");
        if self.subscriber_count() > 0 {
            self.wake();
        }
    }

    /// Whether the clock is suspended.
    pub fn is_suspended(&self) -> bool {
        self.inner.state.borrow().suspended
    }

    /// Current time from the driver, on the frame timestamp timeline.
    pub fn now_ms(&self) -> Option<f64> {
        let driver = self.inner.driver.borrow().clone();
        driver.and_then(|d| d.now_ms())
    }

    /// Timestamp of the most recent frame.
    pub fn last_timestamp(&self) -> Option<f64> {
        self.inner.state.borrow().last_timestamp
    }

    /// Deliver one frame to every subscriber, in subscription order.
    ///
    /// Delivery walks a snapshot taken at frame start: subscribers added during the
    /// frame wait for the next one, and subscribers removed during the frame are not
    /// invoked. Timestamps going backwards are clamped to the previous frame's.
    /// A suspended clock ignores the frame.
    pub fn frame(&self, timestamp_ms: f64) -> FrameReport {
        let (timestamp, snapshot) = {
            let mut state = self.inner.state.borrow_mut();
            if state.suspended {
                return FrameReport::default();
            }
            let timestamp = match state.last_timestamp {
                Some(last) if timestamp_ms.is_nan() || timestamp_ms < last => last,
                None if timestamp_ms.is_nan() => 0.0,
                _ => timestamp_ms,
            };
            state.last_timestamp = Some(timestamp);
            state.frames += 1;
            let snapshot: Vec<(SubscriptionId, Rc<RefCell<FrameCallback>>)> = state
                .subscribers
                .iter()
                .map(|s| (s.id, Rc::clone(&s.callback)))
                .collect();
            (timestamp, snapshot)
        };

        let mut report = FrameReport::default();
        for (id, callback) in snapshot {
            if !self.is_subscribed(id) {
                continue;
            }
            // A callback that re-enters `frame` would find itself borrowed; it is
            // already running for this frame, so skip it.
            let Ok(mut callback) = callback.try_borrow_mut() else {
                continue;
            };
            let outcome = catch_unwind(AssertUnwindSafe(|| (*callback)(timestamp)));
            drop(callback);

            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(err),
                Err(payload) => Some(MotionError::tick(panic_message(payload.as_ref()))),
            };
            match failure {
                None => report.delivered += 1,
                Some(err) => {
                    tracing::warn!(subscription = id.0, error = %err, "frame callback failed; unsubscribing");
                    self.unsubscribe(id);
                    report.failed += 1;
                }
            }
        }

        if self.subscriber_count() > 0 {
            self.wake();
        }
        report
    }

    fn wake(&self) {
        if self.is_suspended() {
            return;
        }
        let driver = self.inner.driver.borrow().clone();
        if let Some(driver) = driver {
            driver.request_frame();
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clock/frame_clock.rs"]
mod tests;
