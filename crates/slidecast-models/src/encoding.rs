//! Segment encoding configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output frame width (portrait)
pub const FRAME_WIDTH: u32 = 1080;
/// Output frame height (portrait)
pub const FRAME_HEIGHT: u32 = 1920;
/// Fixed output frame rate
pub const FRAME_RATE: u32 = 30;

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "medium";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 23;
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";
/// Pixel format accepted by every common player
pub const PIXEL_FORMAT: &str = "yuv420p";

/// Encoding settings for a single slide segment.
///
/// Every segment of one video must share these settings, otherwise the
/// stream-copy join produces a broken file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentEncoding {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    #[serde(default = "default_video_codec")]
    pub codec: String,

    #[serde(default = "default_preset")]
    pub preset: String,

    /// Quality, 0-51, lower is better
    #[serde(default = "default_crf")]
    pub crf: u8,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
}

fn default_width() -> u32 {
    FRAME_WIDTH
}
fn default_height() -> u32 {
    FRAME_HEIGHT
}
fn default_frame_rate() -> u32 {
    FRAME_RATE
}
fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}

impl Default for SegmentEncoding {
    fn default() -> Self {
        Self {
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
            frame_rate: FRAME_RATE,
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
        }
    }
}

impl SegmentEncoding {
    /// Scale the still image to cover the frame, then crop the overflow.
    pub fn video_filter(&self) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1",
            w = self.width,
            h = self.height
        )
    }

    /// Codec arguments for FFmpeg output.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-tune".to_string(),
            "stillimage".to_string(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            PIXEL_FORMAT.to_string(),
            "-r".to_string(),
            self.frame_rate.to_string(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_portrait_1080p() {
        let config = SegmentEncoding::default();
        assert_eq!((config.width, config.height), (1080, 1920));
        assert_eq!(config.codec, "libx264");
    }

    #[test]
    fn test_ffmpeg_args_pin_pixel_format() {
        let args = SegmentEncoding::default().to_ffmpeg_args();
        let pos = args.iter().position(|a| a == "-pix_fmt").unwrap();
        assert_eq!(args[pos + 1], "yuv420p");
        assert!(args.contains(&"stillimage".to_string()));
    }

    #[test]
    fn test_video_filter_uses_frame_size() {
        let filter = SegmentEncoding::default().video_filter();
        assert!(filter.starts_with("scale=1080:1920"));
        assert!(filter.contains("crop=1080:1920"));
    }
}
