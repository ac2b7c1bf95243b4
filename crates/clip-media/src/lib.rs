//! Clip extraction and encoding.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a runner with timeouts
//! - A yt-dlp backed [`SourceResolver`] turning candidate formats into streams
//! - A two-pass FFmpeg [`Transcoder`] (range copy, then frame-accurate encode)
//! - The [`ClipOrchestrator`], which walks candidate formats with fallback

pub mod command;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod resolver;
pub mod transcoder;

pub use command::{check_ffmpeg, check_ytdlp, FfmpegCommand, FfmpegRunner};
pub use error::{ClipError, MediaError, MediaResult};
pub use orchestrator::ClipOrchestrator;
pub use resolver::{SourceLocator, SourceResolver, YtDlpResolver};
pub use transcoder::{CutPlan, FfmpegTranscoder, Transcoder};
