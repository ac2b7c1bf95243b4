//! Range extraction and re-encoding.
//!
//! Extraction is a single FFmpeg pass. Every input is seeked to the requested
//! start before it is opened, so only the requested range is read from the
//! remote streams. Because the range is re-encoded, FFmpeg decodes from the
//! preceding keyframe and drops frames up to the start, which keeps the cut
//! frame accurate.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use clip_models::OutputTarget;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::resolver::SourceLocator;

/// Cuts a range out of resolved streams and encodes it to a target.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Produce the encoded bytes of `[start, end]`.
    ///
    /// Every file written goes under `work_dir`, which the caller owns and
    /// removes.
    async fn extract_and_encode(
        &self,
        locator: &SourceLocator,
        start: f64,
        end: f64,
        target: &OutputTarget,
        work_dir: &Path,
    ) -> MediaResult<Vec<u8>>;
}

/// Where the cut starts in the source and how long it runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutPlan {
    /// Input seek, in source seconds
    pub start: f64,
    /// Duration of the encoded clip
    pub duration: f64,
}

impl CutPlan {
    pub fn new(start: f64, end: f64) -> Self {
        let start = start.max(0.0);
        Self {
            start,
            duration: (end - start).max(0.0),
        }
    }
}

/// [`Transcoder`] that shells out to FFmpeg.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTranscoder {
    runner: FfmpegRunner,
}

impl FfmpegTranscoder {
    /// Create a transcoder whose FFmpeg invocations time out after `timeout_secs`.
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            runner: FfmpegRunner::new().with_timeout(timeout_secs),
        }
    }

    fn cut_command(
        locator: &SourceLocator,
        plan: &CutPlan,
        target: &OutputTarget,
        output: &Path,
    ) -> FfmpegCommand {
        FfmpegCommand::with_inputs(locator.urls.iter().cloned(), output)
            .http_headers(&locator.http_headers)
            .seek(plan.start)
            .duration(plan.duration)
            .map_all_inputs()
            .output_args(target.to_ffmpeg_args())
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn extract_and_encode(
        &self,
        locator: &SourceLocator,
        start: f64,
        end: f64,
        target: &OutputTarget,
        work_dir: &Path,
    ) -> MediaResult<Vec<u8>> {
        if locator.urls.is_empty() {
            return Err(MediaError::format_unavailable(&locator.format, "no streams to read"));
        }

        let plan = CutPlan::new(start, end);
        let output: PathBuf = work_dir.join(target.file_name());

        debug!(
            format = %locator.format,
            start = plan.start,
            duration = plan.duration,
            container = %target.container,
            "Cutting range"
        );
        self.runner
            .run(&Self::cut_command(locator, &plan, target, &output))
            .await?;

        let bytes = tokio::fs::read(&output).await?;
        if bytes.is_empty() {
            return Err(MediaError::EmptyOutput);
        }

        info!(
            format = %locator.format,
            size_kb = bytes.len() / 1024,
            "Encoded clip"
        );
        Ok(bytes)
    }
}
