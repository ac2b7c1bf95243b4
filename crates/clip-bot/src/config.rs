//! Bot configuration.

use std::path::PathBuf;
use std::time::Duration;

use clip_models::FormatTable;

use crate::error::{BotError, BotResult};

/// Default Telegram Bot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
/// Default thumbnail location, `{id}` is replaced by the source id.
pub const DEFAULT_THUMBNAIL_URL_TEMPLATE: &str = "https://i.ytimg.com/vi/{id}/mqdefault.jpg";

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Bot API token
    pub bot_token: String,
    /// Storage chat media is uploaded to before inline edits
    pub channel_id: i64,
    /// Bot API base URL
    pub api_url: String,
    /// Clip length appended when only a source is given
    pub default_duration_secs: f64,
    /// Maximum renders running at once
    pub max_concurrent_renders: usize,
    /// Directory scratch directories are created in
    pub work_dir: PathBuf,
    /// Path of a JSON format table, built-in table when unset
    pub format_table_path: Option<PathBuf>,
    /// Timeout of each yt-dlp and FFmpeg invocation
    pub render_timeout: Duration,
    /// Thumbnail URL template
    pub thumbnail_url_template: String,
    /// Thumbnail fetch timeout
    pub thumbnail_timeout: Duration,
    /// How long a sent result stays editable through message edits
    pub result_cache_ttl: Duration,
    /// Maximum remembered results
    pub result_cache_capacity: usize,
    /// Long polling timeout
    pub poll_timeout: Duration,
    /// Emit JSON logs instead of human readable ones
    pub json_logs: bool,
}

impl BotConfig {
    /// Create config from environment variables.
    pub fn from_env() -> BotResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> BotResult<Self> {
        let required = |key: &str| {
            var(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| BotError::config_error(format!("{} must be set", key)))
        };

        let channel_id = required("BOT_CHANNEL_ID")?;
        let channel_id = channel_id.trim().parse().map_err(|_| {
            BotError::config_error(format!("BOT_CHANNEL_ID is not a chat id: {}", channel_id))
        })?;

        Ok(Self {
            bot_token: required("TELEGRAM_BOT_TOKEN")?,
            channel_id,
            api_url: var("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            default_duration_secs: var("CLIP_DEFAULT_DURATION_SECS")
                .and_then(|s| s.parse().ok())
                .filter(|d: &f64| d.is_finite() && *d > 0.0)
                .unwrap_or(10.0),
            max_concurrent_renders: var("CLIP_MAX_CONCURRENT_RENDERS")
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(2),
            work_dir: var("CLIP_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join("clip-bot")),
            format_table_path: var("CLIP_FORMAT_TABLE")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            render_timeout: Duration::from_secs(
                var("CLIP_RENDER_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            thumbnail_url_template: var("THUMBNAIL_URL_TEMPLATE")
                .unwrap_or_else(|| DEFAULT_THUMBNAIL_URL_TEMPLATE.to_string()),
            thumbnail_timeout: Duration::from_secs(
                var("THUMBNAIL_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            result_cache_ttl: Duration::from_secs(
                var("RESULT_CACHE_TTL_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(86400),
            ),
            result_cache_capacity: var("RESULT_CACHE_CAPACITY")
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(1000),
            poll_timeout: Duration::from_secs(
                var("POLL_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            json_logs: var("LOG_FORMAT")
                .map(|v| v.to_lowercase() == "json")
                .unwrap_or(false),
        })
    }

    /// Candidate format table: the configured file, or the built-in table.
    pub fn format_table(&self) -> BotResult<FormatTable> {
        match &self.format_table_path {
            Some(path) => Ok(FormatTable::load(path)?),
            None => Ok(FormatTable::default()),
        }
    }
}
