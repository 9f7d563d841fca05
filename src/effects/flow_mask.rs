use std::fmt;

/// Distance from either end, in pixels, that still counts as "at the end".
pub const EDGE_SLACK_PX: f64 = 10.0;

/// Fade applied to the edges of a horizontally scrolling strip, hinting that more
/// content lies beyond.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMask {
    /// Content fits; no mask.
    None,
    /// At the start: fade the trailing edge.
    FadeEnd,
    /// At the end: fade the leading edge.
    FadeStart,
    /// Somewhere in between: fade both edges.
    FadeBoth,
}

impl EdgeMask {
    /// Mask for a strip scrolled `scroll_left` pixels with `scroll_width` of content in
    /// `client_width` of visible space.
    pub fn for_scroll(scroll_left: f64, scroll_width: f64, client_width: f64) -> Self {
        if scroll_width <= client_width {
            return Self::None;
        }
        if scroll_left <= EDGE_SLACK_PX {
            Self::FadeEnd
        } else if scroll_left >= scroll_width - client_width - EDGE_SLACK_PX {
            Self::FadeStart
        } else {
            Self::FadeBoth
        }
    }

    /// CSS `mask-image` value.
    pub fn css(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::FadeEnd => "linear-gradient(to right, black 90%, transparent)",
            Self::FadeStart => "linear-gradient(to left, black 90%, transparent)",
            Self::FadeBoth => {
                "linear-gradient(to right, transparent, black 5%, black 95%, transparent)"
            }
        }
    }
}

impl fmt::Display for EdgeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/flow_mask.rs"]
mod tests;
