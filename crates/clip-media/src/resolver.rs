//! Source resolution using yt-dlp.
//!
//! A candidate format is resolved to direct stream URLs without downloading
//! anything; FFmpeg then reads only the requested range from them.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info};

use clip_models::{CandidateFormat, SHORT_URL_BASE};

use crate::command::{check_ytdlp, stderr_tail};
use crate::error::{MediaError, MediaResult};

/// Fetchable streams for one candidate format.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceLocator {
    /// Format the locator was resolved for
    pub format: String,
    /// One combined stream, or separate video and audio streams
    pub urls: Vec<String>,
    /// Headers the streams must be requested with
    pub http_headers: Vec<(String, String)>,
}

/// Resolves a source identifier and candidate format to fetchable streams.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceResolver: Send + Sync {
    /// Resolve `source_id` for `format`.
    ///
    /// Returns [`MediaError::FormatUnavailable`] when the source does not
    /// offer the format.
    async fn resolve(&self, source_id: &str, format: &CandidateFormat) -> MediaResult<SourceLocator>;
}

/// [`SourceResolver`] backed by the `yt-dlp` CLI.
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    timeout: Duration,
}

impl YtDlpResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn build_args(source_url: &str, format: &CandidateFormat) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "-f".to_string(),
            format.selector.clone(),
        ];
        if !format.sort.is_empty() {
            args.push("-S".to_string());
            args.push(format.sort.join(","));
        }
        args.push(source_url.to_string());
        args
    }
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[async_trait]
impl SourceResolver for YtDlpResolver {
    async fn resolve(&self, source_id: &str, format: &CandidateFormat) -> MediaResult<SourceLocator> {
        check_ytdlp()?;

        let source_url = format!("{}{}", SHORT_URL_BASE, source_id);
        let args = Self::build_args(&source_url, format);
        debug!("Running yt-dlp {}", args.join(" "));

        let child = Command::new("yt-dlp")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| MediaError::Timeout(self.timeout.as_secs()))??;

        if !output.status.success() {
            let stderr = stderr_tail(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            return Err(classify_failure(&format.name, &stderr));
        }

        let locator = parse_locator(&format.name, &output.stdout)?;
        info!(
            source_id = %source_id,
            format = %format.name,
            streams = locator.urls.len(),
            "Resolved source streams"
        );
        Ok(locator)
    }
}

/// Map yt-dlp's stderr to an error, separating format problems from the rest.
fn classify_failure(format: &str, stderr: &str) -> MediaError {
    let message = stderr.lines().last().unwrap_or("Unknown error").to_string();
    if stderr.contains("Requested format is not available")
        || stderr.contains("requested format not available")
        || stderr.contains("No video formats found")
    {
        MediaError::format_unavailable(format, message)
    } else {
        MediaError::download_failed(format!("yt-dlp failed: {}", message))
    }
}

#[derive(Debug, Deserialize)]
struct StreamInfo {
    url: Option<String>,
    #[serde(default)]
    http_headers: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct FormatInfo {
    url: Option<String>,
    #[serde(default)]
    http_headers: HashMap<String, String>,
    #[serde(default)]
    requested_formats: Vec<StreamInfo>,
}

/// Extract stream URLs from `yt-dlp --dump-json` output.
///
/// Merged selections list their parts under `requested_formats`; a single
/// stream selection carries its URL at the top level.
fn parse_locator(format: &str, stdout: &[u8]) -> MediaResult<SourceLocator> {
    let info: FormatInfo = serde_json::from_slice(stdout)
        .map_err(|e| MediaError::download_failed(format!("Invalid yt-dlp output: {}", e)))?;

    let (urls, headers) = if info.requested_formats.is_empty() {
        (info.url.into_iter().collect::<Vec<_>>(), info.http_headers)
    } else {
        let headers = info
            .requested_formats
            .first()
            .map(|s| s.http_headers.clone())
            .unwrap_or_default();
        let urls = info
            .requested_formats
            .into_iter()
            .filter_map(|s| s.url)
            .collect::<Vec<_>>();
        (urls, headers)
    };

    if urls.is_empty() {
        return Err(MediaError::format_unavailable(format, "no stream URL returned"));
    }

    let mut http_headers: Vec<(String, String)> = headers.into_iter().collect();
    http_headers.sort();

    Ok(SourceLocator {
        format: format.to_string(),
        urls,
        http_headers,
    })
}
