//! Worker error types.

use std::fmt;

use slidecast_media::MediaError;
use slidecast_queue::QueueError;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Which generated asset of a slide failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaStage {
    Image,
    Audio,
}

impl fmt::Display for MediaStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaStage::Image => f.write_str("image"),
            MediaStage::Audio => f.write_str("audio"),
        }
    }
}

/// Which encoder step of a slide failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingStage {
    Probe,
    Encode,
}

impl fmt::Display for EncodingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingStage::Probe => f.write_str("probe"),
            EncodingStage::Encode => f.write_str("encode"),
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Planning failed: {0}")]
    Planning(String),

    #[error("Media generation failed at {stage}: {message}")]
    MediaGeneration { stage: MediaStage, message: String },

    #[error("Encoding failed at {stage}: {source}")]
    Encoding {
        stage: EncodingStage,
        #[source]
        source: MediaError,
    },

    #[error("Concatenation failed: {0}")]
    Concatenation(String),

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn planning(msg: impl Into<String>) -> Self {
        Self::Planning(msg.into())
    }

    pub fn media_generation(stage: MediaStage, msg: impl Into<String>) -> Self {
        Self::MediaGeneration {
            stage,
            message: msg.into(),
        }
    }

    pub fn encoding(stage: EncodingStage, source: MediaError) -> Self {
        Self::Encoding { stage, source }
    }

    pub fn concatenation(msg: impl Into<String>) -> Self {
        Self::Concatenation(msg.into())
    }

    pub fn workspace(msg: impl Into<String>) -> Self {
        Self::Workspace(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Re-tag an error from a media collaborator with the stage it came from.
    pub fn at_media_stage(self, stage: MediaStage) -> Self {
        match self {
            WorkerError::MediaGeneration { message, .. } => Self::media_generation(stage, message),
            other => Self::media_generation(stage, other.to_string()),
        }
    }

    /// Errors that fail one content item but let the run continue.
    ///
    /// Everything else (store corruption, failed write-back, bad
    /// configuration) aborts the run.
    pub fn is_item_scoped(&self) -> bool {
        matches!(
            self,
            WorkerError::Planning(_)
                | WorkerError::MediaGeneration { .. }
                | WorkerError::Encoding { .. }
                | WorkerError::Concatenation(_)
                | WorkerError::Workspace(_)
                | WorkerError::Internal(_)
                | WorkerError::Io(_)
        )
    }
}
