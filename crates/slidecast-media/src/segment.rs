//! Still-image + narration segment encoding.

use std::path::Path;
use tracing::info;

use slidecast_models::SegmentEncoding;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Build the command that loops `image` for `duration` seconds over `audio`.
///
/// The explicit `-t` plus `-shortest` keeps the segment length equal to the
/// narration rather than the endlessly looped image.
pub fn build_segment_command(
    image: &Path,
    audio: &Path,
    duration: f64,
    output: &Path,
    encoding: &SegmentEncoding,
) -> FfmpegCommand {
    let loop_args = [
        "-loop".to_string(),
        "1".to_string(),
        "-framerate".to_string(),
        encoding.frame_rate.to_string(),
    ];

    FfmpegCommand::new(output)
        .input_with_args(loop_args, image)
        .input(audio)
        .map("0:v:0")
        .map("1:a:0")
        .video_filter(encoding.video_filter())
        .output_args(encoding.to_ffmpeg_args())
        .duration(duration)
        .shortest()
        .faststart()
}

/// Encode one slide segment.
pub async fn render_still_segment(
    image: &Path,
    audio: &Path,
    duration: f64,
    output: &Path,
    encoding: &SegmentEncoding,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    for input in [image, audio] {
        if !input.exists() {
            return Err(MediaError::FileNotFound(input.to_path_buf()));
        }
    }

    if !duration.is_finite() || duration <= 0.0 {
        return Err(MediaError::invalid_duration(format!(
            "cannot encode a segment of {} seconds",
            duration
        )));
    }

    let cmd = build_segment_command(image, audio, duration, output, encoding);
    runner.run(&cmd).await?;

    info!(
        output = %output.display(),
        duration_secs = duration,
        "Encoded slide segment"
    );
    Ok(())
}
