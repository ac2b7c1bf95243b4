//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Number of stderr lines kept on failure.
const STDERR_TAIL_LINES: usize = 20;
/// FFmpeg log level; only errors reach stderr.
const LOG_LEVEL: &str = "error";

/// Builder for FFmpeg commands.
///
/// Several inputs are supported (e.g. separate video and audio streams);
/// input arguments such as seeking are applied to every input.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input locations (files or URLs)
    inputs: Vec<String>,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before each -i)
    input_args: Vec<String>,
    /// Output arguments (after the last -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command with a single input.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self::with_inputs([input.as_ref().to_string_lossy().to_string()], output)
    }

    /// Create a new FFmpeg command reading from several inputs.
    pub fn with_inputs<I, S>(inputs: I, output: impl AsRef<Path>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
        }
    }

    /// Add input arguments (before each -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set input seek position (frame accurate when re-encoding).
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.3}", seconds))
    }

    /// Set output duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    /// Pass extra HTTP headers when reading network inputs.
    pub fn http_headers(self, headers: &[(String, String)]) -> Self {
        if headers.is_empty() {
            return self;
        }
        let joined: String = headers
            .iter()
            .map(|(name, value)| format!("{}: {}\r\n", name, value))
            .collect();
        self.input_arg("-headers").input_arg(joined)
    }

    /// Map every input's streams into the output.
    pub fn map_all_inputs(mut self) -> Self {
        for index in 0..self.inputs.len() {
            self = self.output_arg("-map").output_arg(index.to_string());
        }
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        // Overwrite flag
        if self.overwrite {
            args.push("-y".to_string());
        }

        // Log level
        args.push("-v".to_string());
        args.push(LOG_LEVEL.to_string());
        args.push("-nostdin".to_string());

        for input in &self.inputs {
            args.extend(self.input_args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.clone());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with a timeout.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self { timeout_secs: None }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run an FFmpeg command.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        check_ffmpeg()?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Dropping the future on timeout kills the child (kill_on_drop)
        let output = match self.timeout_secs {
            Some(secs) => {
                match tokio::time::timeout(Duration::from_secs(secs), child.wait_with_output()).await
                {
                    Ok(result) => result?,
                    Err(_) => {
                        warn!("FFmpeg timed out after {} seconds, killing process", secs);
                        return Err(MediaError::Timeout(secs));
                    }
                }
            }
            None => child.wait_with_output().await?,
        };

        if output.status.success() {
            Ok(())
        } else {
            let stderr = stderr_tail(&output.stderr);
            debug!("FFmpeg stderr: {}", stderr);
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(stderr),
                output.status.code(),
            ))
        }
    }
}

/// Last lines of a tool's stderr.
pub(crate) fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if yt-dlp is available.
pub fn check_ytdlp() -> MediaResult<PathBuf> {
    which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)
}
