//! Visibility gating: observation options, the gate itself, and the headless
//! geometry backend.

pub(crate) mod geometry;
pub(crate) mod options;
pub(crate) mod visibility;
