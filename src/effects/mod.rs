//! Built-in page effects.

pub(crate) mod ambient;
pub(crate) mod counter;
pub(crate) mod cursor_glow;
pub(crate) mod flow_mask;
pub(crate) mod hover;
pub(crate) mod parallax;
pub(crate) mod reveal;
pub(crate) mod sections;
