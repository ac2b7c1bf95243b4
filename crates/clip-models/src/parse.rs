//! Free-text clip request parsing.
//!
//! A message is scanned for the first recognizable source URL. Bounds come
//! from up to two tokens right after the URL (`start end`, or just `end`)
//! and from a `t=` start marker on the URL itself.
//!
//! Outcomes are kept distinct:
//! - `Ok(None)`: nothing to act on (no source, or a source with no end bound)
//! - `Err(ParseError)`: a source was found but its range is invalid
//! - `Ok(Some(request))`: a complete, validated request

use thiserror::Error;
use url::Url;

use crate::request::Request;
use crate::timestamp::{
    format_offset, parse_start_marker, parse_timestamp, TimestampError,
};

/// Length of a source identifier.
pub const SOURCE_ID_LEN: usize = 11;

/// Hosts serving the `/watch`, `/shorts/`, `/embed/`, `/live/` and `/v/` shapes.
const LONG_HOSTS: [&str; 4] = [
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
];

/// Host serving the `/<id>` short shape.
const SHORT_HOST: &str = "youtu.be";

/// Errors for text that names a source but carries an invalid range.
///
/// The `Display` output is shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Invalid bound '{token}': {reason}")]
    InvalidBound {
        token: String,
        reason: TimestampError,
    },

    #[error("Invalid start marker '{marker}': {reason}")]
    InvalidStartMarker {
        marker: String,
        reason: TimestampError,
    },

    #[error("Too many bounds: expected at most 2, got {0}")]
    TooManyBounds(usize),

    #[error("End ({end:.1}s) is before start ({start:.1}s)")]
    EndBeforeStart { start: f64, end: f64 },
}

/// A recognized source reference inside a message.
#[derive(Debug, Clone, PartialEq)]
struct SourceRef {
    source_id: String,
    start_marker: Option<f64>,
}

/// Parse free text into a clip request.
///
/// Missing end bounds are never defaulted here; see
/// [`parse_with_default_duration`] for the caller-side fallback.
pub fn parse_request(text: &str) -> Result<Option<Request>, ParseError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    let mut found = None;
    for (index, token) in tokens.iter().enumerate() {
        if let Some(source) = recognize_source(token)? {
            found = Some((index, source));
            break;
        }
    }
    let Some((index, source)) = found else {
        return Ok(None);
    };

    let bound_tokens: Vec<&str> = tokens[index + 1..]
        .iter()
        .copied()
        .take_while(|t| looks_like_bound(t))
        .collect();

    let bounds = bound_tokens
        .iter()
        .map(|token| {
            parse_timestamp(token).map_err(|reason| ParseError::InvalidBound {
                token: token.to_string(),
                reason,
            })
        })
        .collect::<Result<Vec<f64>, ParseError>>()?;

    let (start, end) = match bounds.as_slice() {
        [] => return Ok(None),
        [end] => (source.start_marker.unwrap_or(0.0), *end),
        [start, end] => (*start, *end),
        more => return Err(ParseError::TooManyBounds(more.len())),
    };

    let request = Request::new(source.source_id, start, end);
    if request.end < request.start {
        return Err(ParseError::EndBeforeStart {
            start: request.start,
            end: request.end,
        });
    }
    Ok(Some(request))
}

/// Evaluate parse attempts in order and keep the first complete request.
///
/// Attempts are consumed lazily, so later ones are not evaluated once one
/// succeeds. If none succeeds, the last error is returned when any attempt
/// failed validation; `Ok(None)` means nothing matched at all.
pub fn first_match<T, E, I>(attempts: I) -> Result<Option<T>, E>
where
    I: IntoIterator<Item = Result<Option<T>, E>>,
{
    let mut last_error = None;
    for attempt in attempts {
        match attempt {
            Ok(Some(found)) => return Ok(Some(found)),
            Ok(None) => {}
            Err(e) => last_error = Some(e),
        }
    }

    match last_error {
        Some(e) => Err(e),
        None => Ok(None),
    }
}

/// Best-effort parse that fills in missing bounds.
///
/// Tries the text as-is, then with a default end appended, then with a
/// default `0 <duration>` range appended.
pub fn parse_with_default_duration(
    text: &str,
    default_duration: f64,
) -> Result<Option<Request>, ParseError> {
    let duration = format_offset(default_duration);
    let variants = [
        text.to_string(),
        format!("{} {}", text, duration),
        format!("{} 0 {}", text, duration),
    ];

    first_match(variants.iter().map(|variant| parse_request(variant)))
}

/// Whether a token is meant as a bound, even if it later fails to parse.
///
/// A lone `-` or `+` is ordinary punctuation, so a digit is required.
fn looks_like_bound(token: &str) -> bool {
    token
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
        && token.chars().any(|c| c.is_ascii_digit())
}

/// Recognize a source URL token.
///
/// Unknown hosts, unknown paths and malformed identifiers are simply not a
/// match. A malformed `t=` marker on an otherwise valid URL is an error.
fn recognize_source(token: &str) -> Result<Option<SourceRef>, ParseError> {
    let Some(url) = parse_url(token) else {
        return Ok(None);
    };
    let Some(host) = url.host_str().map(|h| h.to_ascii_lowercase()) else {
        return Ok(None);
    };

    let candidate = if host == SHORT_HOST {
        first_path_segment(&url, 0)
    } else if LONG_HOSTS.contains(&host.as_str()) {
        extract_from_long_url(&url)
    } else {
        None
    };

    let Some(source_id) = candidate.filter(|id| is_valid_source_id(id)) else {
        return Ok(None);
    };

    let start_marker = url
        .query_pairs()
        .find(|(key, _)| key == "t" || key == "start")
        .map(|(_, value)| {
            parse_start_marker(&value).map_err(|reason| ParseError::InvalidStartMarker {
                marker: value.to_string(),
                reason,
            })
        })
        .transpose()?;

    Ok(Some(SourceRef {
        source_id,
        start_marker,
    }))
}

/// Parse a token as a URL, accepting scheme-less `youtu.be/...` forms.
fn parse_url(token: &str) -> Option<Url> {
    let lower = token.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Url::parse(token).ok();
    }

    let bare_host = SHORT_HOST.to_string() + "/";
    if lower.starts_with(&bare_host)
        || LONG_HOSTS.iter().any(|h| lower.starts_with(&format!("{}/", h)))
    {
        return Url::parse(&format!("https://{}", token)).ok();
    }
    None
}

/// Extract the id from `/watch?v=`, `/shorts/`, `/embed/`, `/live/` and `/v/` URLs.
fn extract_from_long_url(url: &Url) -> Option<String> {
    match url.path_segments()?.next()? {
        "watch" => url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned()),
        "shorts" | "embed" | "live" | "v" => first_path_segment(url, 1),
        _ => None,
    }
}

fn first_path_segment(url: &Url, index: usize) -> Option<String> {
    url.path_segments()?
        .nth(index)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Source ids are exactly 11 characters of `[A-Za-z0-9_-]`.
pub fn is_valid_source_id(id: &str) -> bool {
    id.len() == SOURCE_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
