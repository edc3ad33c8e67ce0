//! External service boundaries.
//!
//! Each trait is a single request/response call. Implementations must not
//! retry internally; a failed item is retried by running the pipeline again.

use async_trait::async_trait;

use crate::error::WorkerResult;

/// Generative text service used to plan slides.
#[async_trait]
pub trait TextPlanner: Send + Sync {
    /// Send `prompt` and return the raw response text (expected to be JSON).
    async fn generate(&self, prompt: &str) -> WorkerResult<String>;
}

/// Image-generation service.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Produce encoded image bytes for `prompt` at roughly `width`x`height`.
    async fn generate(&self, prompt: &str, width: u32, height: u32) -> WorkerResult<Vec<u8>>;
}

/// Speech-synthesis service.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Produce encoded audio bytes speaking `text`.
    async fn synthesize(&self, text: &str) -> WorkerResult<Vec<u8>>;
}
