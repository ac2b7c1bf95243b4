//! Clip request value type.

use serde::{Deserialize, Serialize};

use crate::timestamp::{format_offset, round_offset};

/// Base URL used when rendering a request back into text.
pub const SHORT_URL_BASE: &str = "https://youtu.be/";

/// A normalized clip request: which source, and which range of it.
///
/// Offsets are kept rounded to one decimal place and always satisfy
/// `0 <= start <= end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Opaque source identifier (an 11 character video id)
    pub source_id: String,
    /// Start offset in seconds
    pub start: f64,
    /// End offset in seconds
    pub end: f64,
}

impl Request {
    /// Create a request, rounding both offsets to one decimal place.
    ///
    /// Callers are expected to have validated the range; this only
    /// normalizes it.
    pub fn new(source_id: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            source_id: source_id.into(),
            start: round_offset(start),
            end: round_offset(end),
        }
    }

    /// Canonical watch URL of the source.
    pub fn source_url(&self) -> String {
        format!("{}{}", SHORT_URL_BASE, self.source_id)
    }

    /// Text form that parses back into the same request.
    ///
    /// Used as the caption of an editable control surface.
    pub fn query_text(&self) -> String {
        format!(
            "{} {} {}",
            self.source_url(),
            format_offset(self.start),
            format_offset(self.end)
        )
    }

    /// Source URL that starts playback at the clip start.
    pub fn start_timestamp_url(&self) -> String {
        format!("{}?t={}", self.source_url(), self.start.floor() as u64)
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}..{}]",
            self.source_id,
            format_offset(self.start),
            format_offset(self.end)
        )
    }
}
