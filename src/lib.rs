//! motion-gate schedules page effects so that they only animate while their element is on
//! screen.
//!
//! The core is single-threaded and platform-neutral:
//!
//! - A [`FrameClock`] fans one per-frame tick out to every subscribed effect
//! - A [`VisibilityGate`] reports when anchors enter and leave the viewport
//! - An [`EffectRegistry`] ties the two together per [`Effect`], honoring the
//!   [`ReducedMotionPolicy`]
//!
//! Platforms plug in through [`FrameDriver`] and [`ObserverBackend`]. Headless use (tests,
//! the `motion-gate` CLI) pairs [`ManualDriver`] with [`GeometryObserver`]; the `web`
//! feature provides browser bindings on `wasm32`.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod clock;
mod effect;
mod effects;
mod foundation;
mod gate;
mod motion;
mod page;
mod registry;
mod theme;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
mod web;

pub use crate::foundation::core::{AnchorId, BoxSpec, Point, REFERENCE_FRAME_MS, Rect, Size};
pub use crate::foundation::error::{MotionError, MotionResult};

pub use crate::clock::frame_clock::{
    FrameCallback, FrameClock, FrameDriver, FrameReport, ManualDriver, SubscriptionId,
    WeakFrameClock,
};
pub use crate::gate::geometry::{
    AnchorLayout, GeometryObserver, LayoutSource, Viewport, intersection,
};
pub use crate::gate::options::{GateOptions, MarginLength, RootMargin, Tracking};
pub use crate::gate::visibility::{
    GateCallback, IntersectionSample, ObservationHandle, ObserverBackend, VisibilityGate,
    VisibilityRecord, WeakVisibilityGate,
};

pub use crate::effect::ease::Ease;
pub use crate::effect::handle::{Effect, EffectHandle, HandleStats, Phase, Policy, Tick};
pub use crate::effects::ambient::{AmbientEffect, BlobFrame};
pub use crate::effects::counter::{CounterEffect, DEFAULT_COUNTER_DURATION_MS};
pub use crate::effects::cursor_glow::{CursorGlowEffect, GlowState, MIN_GLOW_VIEWPORT_WIDTH};
pub use crate::effects::flow_mask::{EDGE_SLACK_PX, EdgeMask};
pub use crate::effects::hover::{CardTilt, HoverEffect, HoverKind, HoverTransform, MagneticPull};
pub use crate::effects::parallax::{
    LayerTransform, ParallaxEffect, ParallaxLayers, scroll_progress,
};
pub use crate::effects::reveal::RevealEffect;
pub use crate::effects::sections::{SectionTracker, section_gate_options};

pub use crate::motion::policy::{
    EnvPreference, MotionPreferenceSource, REDUCED_MOTION_ENV, ReducedMotionPolicy,
    StaticPreference,
};
pub use crate::registry::binding::{EffectId, EffectRegistry, default_gate_options};
pub use crate::theme::scheme::{
    MemoryThemeStore, Rgba, THEME_STORAGE_KEY, Theme, ThemeController, ThemeStore,
};

pub use crate::page::build::{Assembled, EffectInputs};
pub use crate::page::config::{
    EffectKind, EffectSpec, GateOverride, PageConfig, PointerEvent, ScrollEvent, ViewportSpec,
    VisibilityChange,
};
pub use crate::page::sim::{
    EffectReport, MAX_RUN_STEPS, NAV_SCROLLED_AFTER_PX, Simulation, SimulationReport,
};

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub use crate::web::{
    driver::AnimationFrameDriver,
    intersection::IntersectionBackend,
    layout::DomLayout,
    runtime::{BrowserRuntime, RegisteredEffect},
    storage::{LocalStorageThemeStore, MediaQueryPreference, REDUCED_MOTION_QUERY},
};
