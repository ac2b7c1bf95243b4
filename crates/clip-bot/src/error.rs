//! Bot error types.

use thiserror::Error;

use clip_media::ClipError;
use clip_models::FormatTableError;

pub type BotResult<T> = Result<T, BotError>;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Telegram API call {method} failed: {message}")]
    Api { method: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Thumbnail unavailable: {0}")]
    Thumbnail(String),

    #[error("Render worker failed: {0}")]
    Worker(String),

    #[error(transparent)]
    Clip(#[from] ClipError),

    #[error("Format table error: {0}")]
    FormatTable(#[from] FormatTableError),
}

impl BotError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn api(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            method: method.into(),
            message: message.into(),
        }
    }

    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }

    /// Whether the error is about the user's media and should be shown to
    /// them, as opposed to an operational fault that is only logged.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, BotError::Clip(_))
    }

    /// Text shown to the user in place of a result.
    pub fn user_message(&self) -> String {
        match self {
            BotError::Clip(e) => e.user_message(),
            BotError::Worker(_) => "Render failed, please try again".to_string(),
            other => other.to_string(),
        }
    }
}
