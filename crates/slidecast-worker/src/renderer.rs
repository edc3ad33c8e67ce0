//! Single-slide rendering: image + narration + duration probe + segment encode.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use slidecast_media::{MediaEncoder, MediaError};
use slidecast_models::{RenderedSlide, Slide};

use crate::collaborators::{ImageGenerator, SpeechSynthesizer};
use crate::error::{EncodingStage, MediaStage, WorkerError, WorkerResult};
use crate::metrics::record_slide_rendered;
use crate::workspace::{ArtifactKind, Workspace};

/// Strip quotation marks the speech service would read out or stumble on.
pub fn sanitize_speech_text(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '"' | '\u{201C}' | '\u{201D}'))
        .collect()
}

/// Produces one video segment per slide inside an item's workspace.
pub struct SlideRenderer {
    images: Arc<dyn ImageGenerator>,
    speech: Arc<dyn SpeechSynthesizer>,
    encoder: Arc<dyn MediaEncoder>,
    width: u32,
    height: u32,
}

impl SlideRenderer {
    pub fn new(
        images: Arc<dyn ImageGenerator>,
        speech: Arc<dyn SpeechSynthesizer>,
        encoder: Arc<dyn MediaEncoder>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            images,
            speech,
            encoder,
            width,
            height,
        }
    }

    /// Render slide `index` of the plan.
    ///
    /// Image and narration are requested concurrently; both must land before
    /// the audio is probed and the segment encoded.
    pub async fn render(
        &self,
        slide: &Slide,
        index: usize,
        workspace: &Workspace,
    ) -> WorkerResult<RenderedSlide> {
        let started = Instant::now();
        let image_path = workspace.path_for(ArtifactKind::Image, index);
        let audio_path = workspace.path_for(ArtifactKind::Audio, index);
        let segment_path = workspace.path_for(ArtifactKind::Segment, index);

        let (image, audio) = tokio::join!(
            self.fetch_image(&slide.image_prompt, &image_path),
            self.fetch_audio(&slide.speak_text, &audio_path),
        );
        image?;
        audio?;
        debug!(slide_index = index, "Slide media written");

        let duration = self
            .encoder
            .probe_duration(&audio_path)
            .await
            .map_err(|e| WorkerError::encoding(EncodingStage::Probe, e))?;

        if !duration.is_finite() || duration <= 0.0 {
            return Err(WorkerError::encoding(
                EncodingStage::Probe,
                MediaError::invalid_duration(format!("non-positive duration {}", duration)),
            ));
        }

        self.encoder
            .render_segment(&image_path, &audio_path, duration, &segment_path)
            .await
            .map_err(|e| WorkerError::encoding(EncodingStage::Encode, e))?;

        let elapsed = started.elapsed().as_secs_f64();
        record_slide_rendered(elapsed);
        info!(
            slide_index = index,
            duration_secs = duration,
            elapsed_secs = elapsed,
            "Slide rendered"
        );

        Ok(RenderedSlide::new(index, segment_path))
    }

    async fn fetch_image(&self, prompt: &str, path: &Path) -> WorkerResult<()> {
        let bytes = self
            .images
            .generate(prompt, self.width, self.height)
            .await
            .map_err(|e| e.at_media_stage(MediaStage::Image))?;

        tokio::fs::write(path, &bytes).await.map_err(|e| {
            WorkerError::media_generation(
                MediaStage::Image,
                format!("write {}: {}", path.display(), e),
            )
        })
    }

    async fn fetch_audio(&self, text: &str, path: &Path) -> WorkerResult<()> {
        let text = sanitize_speech_text(text);
        let bytes = self
            .speech
            .synthesize(&text)
            .await
            .map_err(|e| e.at_media_stage(MediaStage::Audio))?;

        tokio::fs::write(path, &bytes).await.map_err(|e| {
            WorkerError::media_generation(
                MediaStage::Audio,
                format!("write {}: {}", path.display(), e),
            )
        })
    }
}
