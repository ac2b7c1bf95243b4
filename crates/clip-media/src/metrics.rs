//! Render metrics.
//!
//! Only recorded; installing an exporter is left to the embedding binary.

use metrics::{counter, histogram};

use clip_models::MediaClass;

/// Metric names as constants for consistency.
pub mod names {
    pub const RENDER_ATTEMPTS_TOTAL: &str = "clip_render_attempts_total";
    pub const RENDER_FAILURES_TOTAL: &str = "clip_render_failures_total";
    pub const RENDER_DURATION_SECONDS: &str = "clip_render_duration_seconds";
}

/// Record one candidate format being tried.
pub fn record_render_attempt(class: MediaClass, format: &str) {
    let labels = [
        ("media_class", class.as_str().to_string()),
        ("format", format.to_string()),
    ];
    counter!(names::RENDER_ATTEMPTS_TOTAL, &labels).increment(1);
}

/// Record a failed candidate, with whether it was skipped as unusable.
pub fn record_render_failure(class: MediaClass, format: &str, unusable: bool) {
    let labels = [
        ("media_class", class.as_str().to_string()),
        ("format", format.to_string()),
        ("kind", if unusable { "unusable" } else { "fault" }.to_string()),
    ];
    counter!(names::RENDER_FAILURES_TOTAL, &labels).increment(1);
}

/// Record the wall time of a successful render.
pub fn record_render_duration(class: MediaClass, duration_secs: f64) {
    let labels = [("media_class", class.as_str().to_string())];
    histogram!(names::RENDER_DURATION_SECONDS, &labels).record(duration_secs);
}
