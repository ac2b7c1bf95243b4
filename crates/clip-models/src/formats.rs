//! Candidate source format policy.
//!
//! The table maps each [`MediaClass`] to an ordered list of source formats,
//! best first. Renders walk the list in order until one format works, so
//! tuning the fallback behavior is a data change here, not a code change in
//! the orchestrator.
//!
//! The table is plain JSON:
//!
//! ```json
//! {
//!   "audio": [
//!     { "name": "best-audio", "selector": "bestaudio*/best", "sort": ["proto", "hasaud"] }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::media_class::MediaClass;

/// One ranked way of fetching a source for a media class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFormat {
    /// Short name used in logs, metrics and error messages
    pub name: String,
    /// yt-dlp format selector (`-f`)
    pub selector: String,
    /// yt-dlp format sort keys (`-S`), most significant first
    #[serde(default)]
    pub sort: Vec<String>,
}

impl CandidateFormat {
    pub fn new<I, S>(name: &str, selector: &str, sort: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
            sort: sort.into_iter().map(Into::into).collect(),
        }
    }
}

/// Errors raised while loading a format table.
#[derive(Debug, Error)]
pub enum FormatTableError {
    #[error("Format table has no entry for media class '{0}'")]
    MissingClass(MediaClass),

    #[error("Format table entry for media class '{0}' is empty")]
    EmptyClass(MediaClass),

    #[error("Format table is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read format table: {0}")]
    Io(#[from] std::io::Error),
}

/// Ordered candidate formats per media class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatTable(HashMap<MediaClass, Vec<CandidateFormat>>);

impl Default for FormatTable {
    fn default() -> Self {
        let mut table = HashMap::new();
        table.insert(
            MediaClass::Preview,
            vec![CandidateFormat::new(
                "fast-low-res",
                "bestvideo*[height<=480]+bestaudio/best[height<=480]/bestvideo*+bestaudio/best",
                ["proto", "+res:480"],
            )],
        );
        table.insert(
            MediaClass::Video,
            vec![
                CandidateFormat::new(
                    "best-combined",
                    "bestvideo*+bestaudio/best",
                    ["proto", "res:1080"],
                ),
                CandidateFormat::new(
                    "best-combined-capped",
                    "bestvideo*[height<=720]+bestaudio/best[height<=720]",
                    ["proto", "res:720"],
                ),
                CandidateFormat::new("single-file", "best[ext=mp4]/best", ["proto"]),
            ],
        );
        table.insert(
            MediaClass::Audio,
            vec![CandidateFormat::new(
                "best-audio",
                "bestaudio*/bestaudio/best",
                ["proto", "hasaud"],
            )],
        );
        Self(table)
    }
}

impl FormatTable {
    /// Build a table, checking every media class has at least one candidate.
    pub fn new(
        table: HashMap<MediaClass, Vec<CandidateFormat>>,
    ) -> Result<Self, FormatTableError> {
        let table = Self(table);
        table.validate()?;
        Ok(table)
    }

    /// Parse and validate a JSON table.
    pub fn from_json(json: &str) -> Result<Self, FormatTableError> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Load and validate a JSON table from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FormatTableError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Candidates for a media class, best first.
    pub fn candidates(&self, class: MediaClass) -> &[CandidateFormat] {
        self.0.get(&class).map(Vec::as_slice).unwrap_or_default()
    }

    fn validate(&self) -> Result<(), FormatTableError> {
        for class in MediaClass::ALL {
            match self.0.get(&class) {
                None => return Err(FormatTableError::MissingClass(class)),
                Some(candidates) if candidates.is_empty() => {
                    return Err(FormatTableError::EmptyClass(class))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}
