use std::{fmt, rc::Rc};

use crate::foundation::error::{MotionError, MotionResult};

pub use kurbo::{Point, Rect, Size};

/// Duration of one frame at the 60 Hz reference rate, in milliseconds.
///
/// Effects whose motion was tuned "per frame" convert elapsed time through this
/// constant so they look the same at any refresh rate.
pub const REFERENCE_FRAME_MS: f64 = 1000.0 / 60.0;

/// Opaque reference to a page element that owns a bounding box.
///
/// The scheduler never interprets the id; platform backends resolve it (element id
/// in the browser, a layout table entry when headless).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AnchorId(Rc<str>);

impl AnchorId {
    /// Build an anchor id, rejecting empty or whitespace-only names.
    pub fn new(id: impl AsRef<str>) -> MotionResult<Self> {
        let id = id.as_ref().trim();
        if id.is_empty() {
            return Err(MotionError::registration("anchor id must not be empty"));
        }
        Ok(Self(Rc::from(id)))
    }

    /// Borrow the id text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AnchorId {
    type Error = MotionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AnchorId> for String {
    fn from(value: AnchorId) -> Self {
        value.0.to_string()
    }
}

/// Axis-aligned box in document or viewport space, as written in page configs.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoxSpec {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width, must be >= 0.
    pub width: f64,
    /// Height, must be >= 0.
    pub height: f64,
}

impl BoxSpec {
    /// Convert to a `kurbo` rectangle.
    pub fn to_rect(self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
