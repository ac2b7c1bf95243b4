//! Output encoding targets.

use serde::{Deserialize, Serialize};

use crate::media_class::MediaClass;

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default video audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "libopus";
/// Audio-only codec
pub const AUDIO_ONLY_CODEC: &str = "libmp3lame";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "veryfast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 23;
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";
/// Height previews are scaled down to
pub const PREVIEW_HEIGHT: u32 = 480;

/// Video stream settings of an output target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoEncoding {
    /// Video codec (e.g., "libx264")
    pub codec: String,
    /// Encoding preset (e.g., "veryfast", "medium")
    pub preset: String,
    /// Constant Rate Factor (quality, 0-51, lower is better)
    pub crf: u8,
    /// Optional scale-down height
    pub max_height: Option<u32>,
}

/// What a rendered clip is encoded to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputTarget {
    /// Container file extension (e.g., "mp4", "mp3")
    pub container: String,
    /// Video settings, `None` for audio-only targets
    pub video: Option<VideoEncoding>,
    /// Audio codec
    pub audio_codec: String,
    /// Audio bitrate
    pub audio_bitrate: String,
}

impl OutputTarget {
    /// Target required by the destination for a media class.
    pub fn for_class(class: MediaClass) -> Self {
        match class {
            MediaClass::Video => Self::video(None),
            MediaClass::Preview => Self::video(Some(PREVIEW_HEIGHT)),
            MediaClass::Audio => Self {
                container: "mp3".to_string(),
                video: None,
                audio_codec: AUDIO_ONLY_CODEC.to_string(),
                audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            },
        }
    }

    fn video(max_height: Option<u32>) -> Self {
        Self {
            container: "mp4".to_string(),
            video: Some(VideoEncoding {
                codec: DEFAULT_VIDEO_CODEC.to_string(),
                preset: DEFAULT_PRESET.to_string(),
                crf: DEFAULT_CRF,
                max_height,
            }),
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
        }
    }

    /// Output file name inside a working directory.
    pub fn file_name(&self) -> String {
        format!("out.{}", self.container)
    }

    /// Convert to FFmpeg output arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        match &self.video {
            Some(video) => {
                if let Some(height) = video.max_height {
                    // Only scale down; -2 keeps the width even for libx264
                    args.extend([
                        "-vf".to_string(),
                        format!("scale=-2:'min({},ih)'", height),
                    ]);
                }
                args.extend([
                    "-c:v".to_string(),
                    video.codec.clone(),
                    "-preset".to_string(),
                    video.preset.clone(),
                    "-crf".to_string(),
                    video.crf.to_string(),
                    "-pix_fmt".to_string(),
                    "yuv420p".to_string(),
                    "-movflags".to_string(),
                    "+faststart".to_string(),
                ]);
            }
            None => args.push("-vn".to_string()),
        }

        args.extend([
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ]);

        args
    }
}
