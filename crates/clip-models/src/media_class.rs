//! Media classes a clip can be rendered as.

use serde::{Deserialize, Serialize};

/// What kind of artifact a render produces.
///
/// Determines both the candidate source formats and the output target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaClass {
    /// Fast, low resolution video used while the range is still being edited
    Preview,
    /// Final video clip
    Video,
    /// Final audio-only clip
    Audio,
}

impl MediaClass {
    /// All classes, in a stable order.
    pub const ALL: [MediaClass; 3] = [MediaClass::Preview, MediaClass::Video, MediaClass::Audio];

    /// Wire name, also used as the control payload action token.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaClass::Preview => "preview",
            MediaClass::Video => "video",
            MediaClass::Audio => "audio",
        }
    }

    /// Whether the rendered artifact carries a video stream.
    pub fn has_video(&self) -> bool {
        !matches!(self, MediaClass::Audio)
    }
}

impl std::fmt::Display for MediaClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preview" => Ok(MediaClass::Preview),
            "video" => Ok(MediaClass::Video),
            "audio" => Ok(MediaClass::Audio),
            other => Err(format!("unknown media class: {}", other)),
        }
    }
}
