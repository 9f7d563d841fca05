/// Convenience result type used across motion-gate.
pub type MotionResult<T> = Result<T, MotionError>;

/// Top-level error taxonomy used by scheduler APIs.
#[derive(thiserror::Error, Debug)]
pub enum MotionError {
    /// An effect could not be registered (missing or invalid anchor).
    #[error("registration error: {0}")]
    Registration(String),

    /// An effect failed while producing a frame.
    #[error("tick error: {0}")]
    Tick(String),

    /// Visibility observation is unavailable or failed for an anchor.
    #[error("gate error: {0}")]
    Gate(String),

    /// Invalid page configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MotionError {
    /// Build a [`MotionError::Registration`] value.
    pub fn registration(msg: impl Into<String>) -> Self {
        Self::Registration(msg.into())
    }

    /// Build a [`MotionError::Tick`] value.
    pub fn tick(msg: impl Into<String>) -> Self {
        Self::Tick(msg.into())
    }

    /// Build a [`MotionError::Gate`] value.
    pub fn gate(msg: impl Into<String>) -> Self {
        Self::Gate(msg.into())
    }

    /// Build a [`MotionError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
