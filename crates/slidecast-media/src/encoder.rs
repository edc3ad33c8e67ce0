//! Encoder seam used by the pipeline.
//!
//! The worker only talks to FFmpeg through [`MediaEncoder`], so tests can
//! substitute an in-process fake.

use std::path::Path;

use async_trait::async_trait;
use slidecast_models::SegmentEncoding;

use crate::command::FfmpegRunner;
use crate::concat::concat_segments;
use crate::error::MediaResult;
use crate::probe::probe_duration;
use crate::segment::render_still_segment;

/// Audio/video encoder operations needed to build a slide video.
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    /// Playable duration of an audio file in seconds.
    async fn probe_duration(&self, audio: &Path) -> MediaResult<f64>;

    /// Encode a still image held for `duration` seconds over `audio`.
    async fn render_segment(
        &self,
        image: &Path,
        audio: &Path,
        duration: f64,
        output: &Path,
    ) -> MediaResult<()>;

    /// Join the segments listed in a concat manifest, without re-encoding.
    async fn concat(&self, manifest: &Path, output: &Path) -> MediaResult<()>;
}

/// [`MediaEncoder`] backed by the FFmpeg and FFprobe binaries.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEncoder {
    encoding: SegmentEncoding,
    runner: FfmpegRunner,
}

impl FfmpegEncoder {
    pub fn new(encoding: SegmentEncoding) -> Self {
        Self {
            encoding,
            runner: FfmpegRunner::new(),
        }
    }

    /// Kill any FFmpeg process that runs longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }

    pub fn encoding(&self) -> &SegmentEncoding {
        &self.encoding
    }
}

#[async_trait]
impl MediaEncoder for FfmpegEncoder {
    async fn probe_duration(&self, audio: &Path) -> MediaResult<f64> {
        probe_duration(audio, self.runner.timeout()).await
    }

    async fn render_segment(
        &self,
        image: &Path,
        audio: &Path,
        duration: f64,
        output: &Path,
    ) -> MediaResult<()> {
        render_still_segment(image, audio, duration, output, &self.encoding, &self.runner).await
    }

    async fn concat(&self, manifest: &Path, output: &Path) -> MediaResult<()> {
        concat_segments(manifest, output, &self.runner).await
    }
}
