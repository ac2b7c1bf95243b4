//! Control surface rendering.

use clip_models::{encode, Action, ControlState, EditFocus, MediaClass, Request, StepGranularity};

use crate::transport::{InlineButton, InlineKeyboard};

/// Marker put next to the active option of a toggle.
const ACTIVE: &str = "✏️";

/// Keyboard for an editable range.
///
/// Layout: toggles, increments, decrements, preview, then final renders.
pub fn control_surface(state: &ControlState) -> InlineKeyboard {
    let button = |text: String, action: Action| InlineButton::Callback {
        text,
        data: encode(&state.payload(action)),
    };

    let focus_label = match state.focus {
        EditFocus::Start => format!("Start {} / End", ACTIVE),
        EditFocus::End => format!("Start / End {}", ACTIVE),
    };
    let step_label = match state.granularity {
        StepGranularity::Whole => format!("1 {} / 0.1", ACTIVE),
        StepGranularity::Fractional => format!("1 / 0.1 {}", ACTIVE),
    };

    let steps = state.granularity.steps();
    let increments = steps
        .iter()
        .map(|delta| button(format!("+{}", delta), Action::Adjust(*delta)))
        .collect();
    let decrements = steps
        .iter()
        .map(|delta| {
            let delta = delta.negated();
            button(delta.to_string(), Action::Adjust(delta))
        })
        .collect();

    InlineKeyboard {
        rows: vec![
            vec![
                button(focus_label, Action::ToggleFocus),
                button(step_label, Action::ToggleGranularity),
            ],
            increments,
            decrements,
            vec![button("Preview".to_string(), Action::Render(MediaClass::Preview))],
            vec![
                button("Video".to_string(), Action::Render(MediaClass::Video)),
                button("Audio".to_string(), Action::Render(MediaClass::Audio)),
            ],
        ],
    }
}

/// Placeholder shown while a final render runs.
pub fn loading(request: &Request) -> InlineKeyboard {
    InlineKeyboard {
        rows: vec![vec![InlineButton::Url {
            text: "Loading…".to_string(),
            url: request.start_timestamp_url(),
        }]],
    }
}
