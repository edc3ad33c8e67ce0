//! Slide plan models.

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of slides in a plan.
pub const MIN_SLIDES: usize = 4;
/// Maximum number of slides in a plan.
pub const MAX_SLIDES: usize = 6;

/// One narrated slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    /// Short on-screen heading
    pub heading: String,
    /// One or two sentences describing the slide
    pub description: String,
    /// Prompt for the image-generation service
    pub image_prompt: String,
    /// Voiceover text, continuing the story from the previous slide
    pub speak_text: String,
}

/// Ordered slide plan for one content item.
///
/// Order is the narrative order and the order of segments in the final video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SlidePlan {
    pub slides: Vec<Slide>,
}

/// Shape violations in a slide plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanShapeError {
    #[error("expected 4-6 slides, got {0}")]
    SlideCount(usize),

    #[error("slide {index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },
}

impl SlidePlan {
    /// Number of slides.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Check slide count and that every slide field has content.
    pub fn validate(&self) -> Result<(), PlanShapeError> {
        if !(MIN_SLIDES..=MAX_SLIDES).contains(&self.slides.len()) {
            return Err(PlanShapeError::SlideCount(self.slides.len()));
        }

        for (index, slide) in self.slides.iter().enumerate() {
            let fields = [
                ("heading", &slide.heading),
                ("description", &slide.description),
                ("imagePrompt", &slide.image_prompt),
                ("speakText", &slide.speak_text),
            ];
            if let Some(&(field, _)) = fields.iter().find(|(_, v)| v.trim().is_empty()) {
                return Err(PlanShapeError::EmptyField { index, field });
            }
        }

        Ok(())
    }
}

/// A slide's finished video segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedSlide {
    /// Position of the source slide in its plan
    pub index: usize,
    /// Encoded segment inside the item's workspace
    pub segment_path: PathBuf,
}

impl RenderedSlide {
    pub fn new(index: usize, segment_path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            segment_path: segment_path.into(),
        }
    }
}
