//! Offset parsing and formatting.
//!
//! Clip bounds are offsets in seconds from the start of the source. Users
//! type them as `SS`, `MM:SS` or `HH:MM:SS` (each with an optional
//! fraction), and URL start markers use the `1h2m3s` style.

use thiserror::Error;

/// Maximum offset accepted for either bound (24 hours in seconds).
pub const MAX_OFFSET_SECS: f64 = 86400.0;

/// Offset parsing error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("Timestamp cannot be empty")]
    Empty,

    #[error("Timestamp cannot be negative")]
    Negative,

    #[error("Invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    #[error("Invalid timestamp format '{0}'. Use SS, MM:SS or HH:MM:SS")]
    InvalidFormat(String),

    #[error("Timestamp exceeds maximum allowed offset ({} hours)", MAX_OFFSET_SECS / 3600.0)]
    ExceedsMaxOffset,
}

/// Round an offset to one decimal place.
///
/// Every offset stored in a request or a control payload goes through this,
/// since the finest edit step is 0.1s.
/// Negative zero is normalised to zero so it never renders as `-0.0`.
pub fn round_offset(secs: f64) -> f64 {
    (secs * 10.0).round() / 10.0 + 0.0
}

/// Format an offset with exactly one decimal place (`12.5`, `30.0`).
pub fn format_offset(secs: f64) -> String {
    format!("{:.1}", round_offset(secs))
}

/// Parse a clip bound to total seconds.
///
/// Supports `SS`, `MM:SS` and `HH:MM:SS`, each with an optional fraction.
///
/// # Examples
/// ```
/// use clip_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("01:30:00").unwrap(), 5400.0);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
/// assert_eq!(parse_timestamp("90").unwrap(), 90.0);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = ts.split(':').collect();
    let total = match parts.as_slice() {
        [secs] => component(secs, "seconds")?,
        [mins, secs] => component(mins, "minutes")? * 60.0 + component(secs, "seconds")?,
        [hours, mins, secs] => {
            component(hours, "hours")? * 3600.0
                + component(mins, "minutes")? * 60.0
                + component(secs, "seconds")?
        }
        _ => return Err(TimestampError::InvalidFormat(ts.to_string())),
    };

    if total > MAX_OFFSET_SECS {
        return Err(TimestampError::ExceedsMaxOffset);
    }
    Ok(total)
}

/// Parse a URL start marker such as `t=90`, `t=90s`, `t=1m30s` or `t=1h2m3s`.
pub fn parse_start_marker(marker: &str) -> Result<f64, TimestampError> {
    let marker = marker.trim();
    if marker.is_empty() {
        return Err(TimestampError::Empty);
    }

    if !marker.ends_with(['h', 'm', 's']) {
        return parse_timestamp(marker);
    }

    let mut total = 0.0;
    let mut digits = String::new();
    for c in marker.chars() {
        let unit = match c {
            'h' => 3600.0,
            'm' => 60.0,
            's' => 1.0,
            _ => {
                digits.push(c);
                continue;
            }
        };
        if digits.is_empty() {
            return Err(TimestampError::InvalidFormat(marker.to_string()));
        }
        total += component(&digits, "marker")? * unit;
        digits.clear();
    }

    if total > MAX_OFFSET_SECS {
        return Err(TimestampError::ExceedsMaxOffset);
    }
    Ok(total)
}

/// Parse one non-negative numeric component.
///
/// Only plain decimal notation is accepted; `f64::from_str` would also take
/// `inf`, `NaN` and exponents.
fn component(value: &str, name: &'static str) -> Result<f64, TimestampError> {
    let invalid = || TimestampError::InvalidValue(name, value.to_string());

    // Any minus sign is negative, including `-0`.
    if value.starts_with('-') {
        return Err(TimestampError::Negative);
    }
    let unsigned = value.strip_prefix('+').unwrap_or(value);
    if unsigned.is_empty()
        || unsigned == "."
        || !unsigned.chars().all(|c| c.is_ascii_digit() || c == '.')
        || unsigned.matches('.').count() > 1
    {
        return Err(invalid());
    }

    unsigned.parse().map_err(|_| invalid())
}
