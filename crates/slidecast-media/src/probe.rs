//! FFprobe duration measurement.

use serde::Deserialize;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::warn;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// FFprobe JSON output, reduced to what we read.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe a media file for its container duration in seconds.
///
/// Sub-second precision is kept; the value drives the length of the
/// encoded segment. With a `timeout`, a hung FFprobe is killed and
/// reported as [`MediaError::Timeout`].
pub async fn probe_duration(
    path: impl AsRef<Path>,
    timeout: Option<Duration>,
) -> MediaResult<f64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let mut cmd = Command::new("ffprobe");
    cmd.args([
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-print_format",
        "json",
    ])
    .arg(path);

    let output = output_with_timeout(cmd, timeout).await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("FFprobe failed for {}", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_duration(&output.stdout)
}

/// Run `cmd` to completion, killing it once `timeout` elapses.
async fn output_with_timeout(mut cmd: Command, timeout: Option<Duration>) -> MediaResult<Output> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let Some(limit) = timeout else {
        return Ok(cmd.output().await?);
    };

    match tokio::time::timeout(limit, cmd.output()).await {
        Ok(output) => Ok(output?),
        Err(_) => {
            warn!("FFprobe timed out after {:?}, killing process", limit);
            Err(MediaError::Timeout(limit.as_secs()))
        }
    }
}

/// Extract a positive, finite duration from FFprobe JSON output.
fn parse_duration(stdout: &[u8]) -> MediaResult<f64> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let raw = probe
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| MediaError::invalid_duration("no duration in FFprobe output"))?;

    let seconds: f64 = raw
        .trim()
        .parse()
        .map_err(|_| MediaError::invalid_duration(format!("unparseable duration '{}'", raw)))?;

    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(MediaError::invalid_duration(format!(
            "non-positive duration {}",
            seconds
        )));
    }

    Ok(seconds)
}
