//! Shared data models for the clip bot.
//!
//! This crate provides:
//! - Clip requests and free-text request parsing
//! - The control surface state and its callback payload codec
//! - The range edit state machine
//! - Media classes, candidate format policy and output targets

pub mod control;
pub mod encoding;
pub mod formats;
pub mod media_class;
pub mod parse;
pub mod range_edit;
pub mod request;
pub mod timestamp;

// Re-export common types
pub use control::{
    decode, encode, Action, AuthorizationError, ControlPayload, ControlState, Delta, DecodeError,
    EditFocus, StepGranularity, MAX_PAYLOAD_LEN,
};
pub use encoding::{OutputTarget, VideoEncoding};
pub use formats::{CandidateFormat, FormatTable, FormatTableError};
pub use media_class::MediaClass;
pub use parse::{first_match, parse_request, parse_with_default_duration, ParseError};
pub use range_edit::{transition, Transition};
pub use request::{Request, SHORT_URL_BASE};
pub use timestamp::{format_offset, round_offset, TimestampError, MAX_OFFSET_SECS};
