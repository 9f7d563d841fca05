//! Pages described in JSON: building their effects and running them headless.

pub(crate) mod build;
pub(crate) mod config;
pub(crate) mod sim;
