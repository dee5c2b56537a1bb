//! Projection of session, buffer and page time ranges onto a [0, 1] progress strip.

use crate::data::buffer::BufferWindow;
use crate::data::discontinuity::Discontinuity;

/// Minimum width, in pixels, of the current-page marker.
pub const MIN_PAGE_MARKER_PX: f64 = 4.0;

/// A horizontal strip segment in normalised session coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripSegment {
    pub x: f64,
    pub width: f64,
}

/// Everything drawn on the progress strip for one redraw.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferStatus {
    pub page: StripSegment,
    pub buffer: Option<StripSegment>,
    pub gaps: Vec<StripSegment>,
}

/// Maps absolute times to strip fractions for one session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferStatusProjector {
    session_start: f64,
    session_end: f64,
}

impl BufferStatusProjector {
    /// `None` for an empty or inverted session span.
    pub fn new(session_start: f64, session_end: f64) -> Option<Self> {
        (session_end > session_start).then_some(Self {
            session_start,
            session_end,
        })
    }

    pub fn span(&self) -> f64 {
        self.session_end - self.session_start
    }

    pub fn fraction(&self, t: f64) -> f64 {
        (t - self.session_start) / self.span()
    }

    /// Inverse of [`Self::fraction`].
    pub fn time_at(&self, fraction: f64) -> f64 {
        self.session_start + fraction * self.span()
    }

    /// Current-page marker, never narrower than [`MIN_PAGE_MARKER_PX`] pixels.
    pub fn page_marker(&self, curr_sec: f64, seconds_per_page: f64, strip_px: f64) -> StripSegment {
        let min_width = if strip_px > 0.0 {
            MIN_PAGE_MARKER_PX / strip_px
        } else {
            0.0
        };
        StripSegment {
            x: self.fraction(curr_sec),
            width: (seconds_per_page / self.span()).max(min_width),
        }
    }

    /// Decoded range. The server advertises `available_end` as the start of
    /// its last full page, so the marker extends one page further.
    pub fn buffer_marker(&self, window: &BufferWindow, seconds_per_page: f64) -> Option<StripSegment> {
        if !window.is_valid() {
            return None;
        }
        Some(StripSegment {
            x: self.fraction(window.available_start_sec),
            width: (window.available_end_sec + seconds_per_page - window.available_start_sec)
                / self.span(),
        })
    }

    pub fn gap(&self, d: &Discontinuity) -> StripSegment {
        StripSegment {
            x: self.fraction(d.start_sec),
            width: d.duration() / self.span(),
        }
    }

    pub fn status<'a>(
        &self,
        curr_sec: f64,
        seconds_per_page: f64,
        strip_px: f64,
        window: Option<&BufferWindow>,
        gaps: impl IntoIterator<Item = &'a Discontinuity>,
    ) -> BufferStatus {
        BufferStatus {
            page: self.page_marker(curr_sec, seconds_per_page, strip_px),
            buffer: window.and_then(|w| self.buffer_marker(w, seconds_per_page)),
            gaps: gaps.into_iter().map(|d| self.gap(d)).collect(),
        }
    }
}
