//! Control surface state and its callback payload codec.
//!
//! The editable range lives entirely inside the transport's callback
//! payload; nothing is stored server-side. A payload is seven
//! space-separated ASCII fields in fixed order:
//!
//! ```text
//! owner_id source_id start end focus granularity action
//! 123456789 dQw4w9WgXcQ 12.5 20.0 e i -0.5
//! ```
//!
//! - `focus`: `s` (start) or `e` (end)
//! - `granularity`: `i` (whole seconds) or `f` (tenths)
//! - `action`: `preview`, `video`, `audio`, `focus`, `step`, or a signed delta

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::media_class::MediaClass;
use crate::parse::is_valid_source_id;
use crate::request::Request;
use crate::timestamp::{format_offset, round_offset, MAX_OFFSET_SECS};

/// Transport ceiling for a callback payload, in bytes.
pub const MAX_PAYLOAD_LEN: usize = 64;

/// Number of fields in an encoded payload.
pub const PAYLOAD_FIELDS: usize = 7;

/// Largest accepted delta, in tenths of a second (one hour).
pub const MAX_DELTA_TENTHS: i32 = 36_000;

/// Which bound subsequent deltas apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditFocus {
    Start,
    End,
}

impl EditFocus {
    pub fn toggled(self) -> Self {
        match self {
            EditFocus::Start => EditFocus::End,
            EditFocus::End => EditFocus::Start,
        }
    }

    fn token(self) -> &'static str {
        match self {
            EditFocus::Start => "s",
            EditFocus::End => "e",
        }
    }
}

/// Which set of step sizes the surface offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepGranularity {
    Whole,
    Fractional,
}

impl StepGranularity {
    pub fn toggled(self) -> Self {
        match self {
            StepGranularity::Whole => StepGranularity::Fractional,
            StepGranularity::Fractional => StepGranularity::Whole,
        }
    }

    /// Positive step sizes offered at this granularity.
    pub fn steps(self) -> &'static [Delta] {
        const WHOLE: [Delta; 5] = [Delta(10), Delta(20), Delta(50), Delta(100), Delta(300)];
        const FRACTIONAL: [Delta; 3] = [Delta(1), Delta(2), Delta(5)];
        match self {
            StepGranularity::Whole => &WHOLE,
            StepGranularity::Fractional => &FRACTIONAL,
        }
    }

    fn token(self) -> &'static str {
        match self {
            StepGranularity::Whole => "i",
            StepGranularity::Fractional => "f",
        }
    }
}

/// A signed range adjustment, stored in tenths of a second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Delta(i32);

impl Delta {
    pub const fn from_tenths(tenths: i32) -> Self {
        Self(tenths)
    }

    pub fn tenths(self) -> i32 {
        self.0
    }

    pub fn as_secs(self) -> f64 {
        f64::from(self.0) / 10.0
    }

    pub fn negated(self) -> Self {
        Self(-self.0)
    }

    /// Parse `10`, `-0.5`, `+2` style deltas.
    ///
    /// At most one decimal place, non-zero, and within one hour.
    fn parse(token: &str) -> Option<Self> {
        let (negative, unsigned) = match token.as_bytes().first()? {
            b'-' => (true, &token[1..]),
            b'+' => (false, &token[1..]),
            _ => (false, token),
        };
        let (whole, fraction) = match unsigned.split_once('.') {
            Some((whole, fraction)) if fraction.len() == 1 => (whole, fraction),
            Some(_) => return None,
            None => (unsigned, "0"),
        };
        if whole.is_empty()
            || whole.len() > 5
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let tenths = whole.parse::<i32>().ok()? * 10 + fraction.parse::<i32>().ok()?;
        if tenths == 0 || tenths > MAX_DELTA_TENTHS {
            return None;
        }
        Some(Self(if negative { -tenths } else { tenths }))
    }
}

impl std::fmt::Display for Delta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        if magnitude % 10 == 0 {
            write!(f, "{}{}", sign, magnitude / 10)
        } else {
            write!(f, "{}{}.{}", sign, magnitude / 10, magnitude % 10)
        }
    }
}

/// A control surface action, decoded once at the protocol boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Render the current range
    Render(MediaClass),
    /// Switch which bound deltas apply to
    ToggleFocus,
    /// Switch between whole and fractional steps
    ToggleGranularity,
    /// Move the focused bound
    Adjust(Delta),
}

impl Action {
    fn token(&self) -> String {
        match self {
            Action::Render(class) => class.as_str().to_string(),
            Action::ToggleFocus => "focus".to_string(),
            Action::ToggleGranularity => "step".to_string(),
            Action::Adjust(delta) => delta.to_string(),
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token {
            "preview" => Some(Action::Render(MediaClass::Preview)),
            "video" => Some(Action::Render(MediaClass::Video)),
            "audio" => Some(Action::Render(MediaClass::Audio)),
            "focus" => Some(Action::ToggleFocus),
            "step" => Some(Action::ToggleGranularity),
            delta => Delta::parse(delta).map(Action::Adjust),
        }
    }
}

/// Editable range state carried by a control surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    /// The only user allowed to act on this surface
    pub owner_id: i64,
    pub request: Request,
    pub focus: EditFocus,
    pub granularity: StepGranularity,
}

impl ControlState {
    /// Fresh surface: editing the end bound in whole seconds.
    pub fn new(owner_id: i64, request: Request) -> Self {
        Self {
            owner_id,
            request,
            focus: EditFocus::End,
            granularity: StepGranularity::Whole,
        }
    }

    /// Check the acting user against the surface owner.
    pub fn authorize(&self, actor_id: i64) -> Result<(), AuthorizationError> {
        if actor_id == self.owner_id {
            Ok(())
        } else {
            Err(AuthorizationError {
                owner_id: self.owner_id,
                actor_id,
            })
        }
    }

    /// Payload for a button on this surface.
    pub fn payload(&self, action: Action) -> ControlPayload {
        ControlPayload {
            state: self.clone(),
            action,
        }
    }
}

/// A decoded callback payload: the surface state plus the pressed action.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPayload {
    pub state: ControlState,
    pub action: Action,
}

/// A user other than the owner pressed a control.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Only the user who requested this clip can edit it")]
pub struct AuthorizationError {
    pub owner_id: i64,
    pub actor_id: i64,
}

/// A callback payload that is not one of ours, or is corrupt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("expected 7 fields, found {0}")]
    FieldCount(usize),

    #[error("invalid owner id: {0}")]
    InvalidOwner(String),

    #[error("invalid source id: {0}")]
    InvalidSourceId(String),

    #[error("invalid {field} offset: {value}")]
    InvalidOffset { field: &'static str, value: String },

    #[error("end is before start")]
    InvalidRange,

    #[error("invalid edit focus: {0}")]
    InvalidFocus(String),

    #[error("invalid step granularity: {0}")]
    InvalidGranularity(String),

    #[error("invalid action: {0}")]
    InvalidAction(String),
}

/// Encode a payload into its callback form.
pub fn encode(payload: &ControlPayload) -> String {
    let state = &payload.state;
    let encoded = format!(
        "{} {} {} {} {} {} {}",
        state.owner_id,
        state.request.source_id,
        format_offset(state.request.start),
        format_offset(state.request.end),
        state.focus.token(),
        state.granularity.token(),
        payload.action.token(),
    );
    debug_assert!(encoded.len() <= MAX_PAYLOAD_LEN, "payload too long: {}", encoded);
    encoded
}

/// Decode a callback payload.
pub fn decode(data: &str) -> Result<ControlPayload, DecodeError> {
    let fields: Vec<&str> = data.split_whitespace().collect();
    let [owner, source_id, start, end, focus, granularity, action] = fields.as_slice() else {
        return Err(DecodeError::FieldCount(fields.len()));
    };

    let owner_id = owner
        .parse::<i64>()
        .map_err(|_| DecodeError::InvalidOwner(owner.to_string()))?;

    if !is_valid_source_id(source_id) {
        return Err(DecodeError::InvalidSourceId(source_id.to_string()));
    }

    let start = decode_offset("start", start)?;
    let end = decode_offset("end", end)?;
    if end < start {
        return Err(DecodeError::InvalidRange);
    }

    let focus = match *focus {
        "s" => EditFocus::Start,
        "e" => EditFocus::End,
        other => return Err(DecodeError::InvalidFocus(other.to_string())),
    };
    let granularity = match *granularity {
        "i" => StepGranularity::Whole,
        "f" => StepGranularity::Fractional,
        other => return Err(DecodeError::InvalidGranularity(other.to_string())),
    };
    let action =
        Action::parse(action).ok_or_else(|| DecodeError::InvalidAction(action.to_string()))?;

    Ok(ControlPayload {
        state: ControlState {
            owner_id,
            request: Request::new(*source_id, start, end),
            focus,
            granularity,
        },
        action,
    })
}

fn decode_offset(field: &'static str, value: &str) -> Result<f64, DecodeError> {
    let invalid = || DecodeError::InvalidOffset {
        field,
        value: value.to_string(),
    };

    if value.is_empty()
        || !value.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        || value.matches('.').count() > 1
    {
        return Err(invalid());
    }
    let secs: f64 = value.parse().map_err(|_| invalid())?;
    if secs > MAX_OFFSET_SECS {
        return Err(invalid());
    }
    Ok(round_offset(secs))
}
