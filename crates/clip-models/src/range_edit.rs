//! Range edit state machine.
//!
//! States are `{focus} x {granularity}` over a request. Toggles only change
//! how the surface looks, adjustments move one bound, and render actions
//! hand the current request to the orchestrator. There is no terminal
//! state: a surface stays editable for as long as the transport keeps it.

use crate::control::{Action, AuthorizationError, ControlPayload, ControlState, Delta, EditFocus};
use crate::media_class::MediaClass;
use crate::request::Request;
use crate::timestamp::{round_offset, MAX_OFFSET_SECS};

/// What the control handler has to do after an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Only the buttons changed; redraw the control surface.
    Refresh(ControlState),
    /// The range changed; redraw the caption and the control surface.
    Adjusted(ControlState),
    /// Run the orchestrator for the current request.
    Render {
        state: ControlState,
        class: MediaClass,
    },
    /// Nothing changed; do not touch the surface.
    NoOp,
}

impl Transition {
    /// Whether the surface needs any redraw or render.
    pub fn is_noop(&self) -> bool {
        matches!(self, Transition::NoOp)
    }
}

/// Authorize the acting user, then apply the payload's action.
///
/// Authorization is checked before anything is derived from the payload,
/// so a rejected actor never produces a mutated state.
pub fn transition(payload: &ControlPayload, actor_id: i64) -> Result<Transition, AuthorizationError> {
    payload.state.authorize(actor_id)?;
    Ok(payload.state.apply(payload.action))
}

impl ControlState {
    /// Apply an action to this state.
    pub fn apply(&self, action: Action) -> Transition {
        match action {
            Action::Render(class) => Transition::Render {
                state: self.clone(),
                class,
            },
            Action::ToggleFocus => Transition::Refresh(ControlState {
                focus: self.focus.toggled(),
                ..self.clone()
            }),
            Action::ToggleGranularity => Transition::Refresh(ControlState {
                granularity: self.granularity.toggled(),
                ..self.clone()
            }),
            Action::Adjust(delta) => {
                let adjusted = adjust(&self.request, self.focus, delta);
                if adjusted == self.request {
                    Transition::NoOp
                } else {
                    Transition::Adjusted(ControlState {
                        request: adjusted,
                        ..self.clone()
                    })
                }
            }
        }
    }
}

/// Move the focused bound by `delta`, clamped so `0 <= start <= end`.
///
/// The end is also capped at the maximum offset so every state stays
/// encodable.
pub fn adjust(request: &Request, focus: EditFocus, delta: Delta) -> Request {
    let mut adjusted = request.clone();
    match focus {
        EditFocus::End => {
            let end = (request.end + delta.as_secs()).max(request.start);
            adjusted.end = round_offset(end.min(MAX_OFFSET_SECS));
        }
        EditFocus::Start => {
            let start = (request.start + delta.as_secs()).max(0.0).min(request.end);
            adjusted.start = round_offset(start);
        }
    }
    adjusted
}
