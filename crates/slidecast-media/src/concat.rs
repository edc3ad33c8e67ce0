//! Stream-copy concatenation via the FFmpeg concat demuxer.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Quote a path for a concat manifest `file` directive.
fn quote_manifest_path(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

/// Render manifest contents, one `file` line per segment, in the given order.
fn manifest_contents(segments: &[PathBuf]) -> String {
    segments
        .iter()
        .map(|p| format!("file {}\n", quote_manifest_path(p)))
        .collect()
}

/// Write a concat manifest listing `segments` in order.
///
/// Relative paths are resolved against the current directory so the
/// manifest does not depend on where it is stored.
pub async fn write_concat_manifest(manifest: &Path, segments: &[PathBuf]) -> MediaResult<()> {
    if segments.is_empty() {
        return Err(MediaError::invalid_input("no segments to concatenate"));
    }

    let mut resolved = Vec::with_capacity(segments.len());
    for segment in segments {
        if !segment.exists() {
            return Err(MediaError::FileNotFound(segment.clone()));
        }
        resolved.push(tokio::fs::canonicalize(segment).await?);
    }

    tokio::fs::write(manifest, manifest_contents(&resolved)).await?;
    Ok(())
}

/// Build the stream-copy join command for a manifest.
pub fn build_concat_command(manifest: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input_with_args(["-f", "concat", "-safe", "0"], manifest)
        .codec_copy()
        .faststart()
}

/// Join the segments listed in `manifest` into `output` without re-encoding.
pub async fn concat_segments(
    manifest: &Path,
    output: &Path,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    if !manifest.exists() {
        return Err(MediaError::FileNotFound(manifest.to_path_buf()));
    }

    runner.run(&build_concat_command(manifest, output)).await?;

    info!(output = %output.display(), "Concatenated segments");
    Ok(())
}
