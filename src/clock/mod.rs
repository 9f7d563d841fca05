//! Shared per-frame tick source.

pub(crate) mod frame_clock;
