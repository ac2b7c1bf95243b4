//! Error types for media operations.

use thiserror::Error;

use clip_models::MediaClass;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while resolving, extracting or encoding a clip.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("yt-dlp not found in PATH")]
    YtDlpNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Download failed: {message}")]
    DownloadFailed { message: String },

    #[error("Format '{format}' is not usable: {message}")]
    FormatUnavailable { format: String, message: String },

    #[error("Encoded output is empty")]
    EmptyOutput,

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }

    /// Create a format unavailable error.
    pub fn format_unavailable(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FormatUnavailable {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this failure means the candidate format cannot be used.
    ///
    /// Only these failures move the orchestrator on to the next candidate.
    /// Missing tools, timeouts, local I/O faults, network faults and generic
    /// download failures are not the format's fault and abort the render
    /// instead.
    pub fn is_format_unusable(&self) -> bool {
        match self {
            MediaError::FormatUnavailable { .. } | MediaError::EmptyOutput => true,
            MediaError::FfmpegFailed { stderr, .. } => {
                !stderr.as_deref().is_some_and(is_network_fault)
            }
            _ => false,
        }
    }
}

/// Whether tool output points at the network rather than the stream.
fn is_network_fault(output: &str) -> bool {
    let output = output.to_lowercase();
    [
        "connection reset",
        "connection refused",
        "connection timed out",
        "network is unreachable",
        "temporary failure in name resolution",
        "i/o error",
    ]
    .iter()
    .any(|pattern| output.contains(pattern))
}

/// Outcome of a whole clip render.
#[derive(Debug, Error)]
pub enum ClipError {
    /// Every candidate format for the media class failed as unusable.
    #[error("No usable {class} format (tried: {}): {last}", .attempted.join(", "))]
    UnavailableFormat {
        class: MediaClass,
        attempted: Vec<String>,
        #[source]
        last: MediaError,
    },

    /// A failure that is not attributable to the candidate format.
    #[error(transparent)]
    Media(#[from] MediaError),
}

impl ClipError {
    /// Short reason suitable for showing to the user in place of the clip.
    pub fn user_message(&self) -> String {
        match self {
            ClipError::UnavailableFormat { class, last, .. } => {
                format!("Could not render {}: {}", class, last)
            }
            ClipError::Media(e) => format!("Render failed: {}", e),
        }
    }
}
