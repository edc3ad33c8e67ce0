//! Slide video pipeline worker.
//!
//! Turns content items from a JSON store into narrated vertical slide
//! videos:
//! - `SlidePlanner` asks a text model for a 4-6 slide plan
//! - `SlideRenderer` produces one image + narration segment per slide
//! - `Concatenator` joins segments in slide order
//! - `Orchestrator` sequences items and writes completion back to the store

pub mod collaborators;
pub mod concatenator;
pub mod config;
pub mod error;
pub mod gemini;
pub mod imagen;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod planner;
pub mod renderer;
pub mod tts;
pub mod workspace;

pub use collaborators::{ImageGenerator, SpeechSynthesizer, TextPlanner};
pub use concatenator::Concatenator;
pub use config::PipelineConfig;
pub use error::{EncodingStage, MediaStage, WorkerError, WorkerResult};
pub use gemini::{GeminiClient, GeminiConfig};
pub use imagen::{ImagenClient, ImagenConfig};
pub use logging::ItemLogger;
pub use orchestrator::{ItemOutcome, Orchestrator, RunSummary, SkipReason};
pub use planner::SlidePlanner;
pub use renderer::SlideRenderer;
pub use tts::{TtsClient, TtsConfig};
pub use workspace::{ArtifactKind, Workspace};
