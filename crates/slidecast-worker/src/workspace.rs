//! Per-item scratch directory.
//!
//! Every processing attempt of a content item gets its own directory under
//! the output root. All transient slide artifacts and the concat manifest
//! live there, partitioned by slide index, so concurrent renders never
//! touch the same file.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{WorkerError, WorkerResult};

/// Transient artifact produced while rendering one slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Image,
    Audio,
    Segment,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Image => "png",
            ArtifactKind::Audio => "mp3",
            ArtifactKind::Segment => "mp4",
        }
    }
}

/// Scoped working directory for one item attempt.
///
/// Removed by [`Workspace::release`], kept by [`Workspace::retain`], and
/// removed synchronously on drop if neither was called.
#[derive(Debug)]
pub struct Workspace {
    dir: PathBuf,
    token: String,
    item_index: usize,
    released: bool,
}

impl Workspace {
    /// Create `<root>/<token>_<item_index>.work/`.
    ///
    /// Fails if the directory already exists; workspaces are never reused.
    pub async fn acquire(root: &Path, token: &str, item_index: usize) -> WorkerResult<Self> {
        tokio::fs::create_dir_all(root).await.map_err(|e| {
            WorkerError::workspace(format!("create {}: {}", root.display(), e))
        })?;

        let dir = root.join(format!("{}_{}.work", token, item_index));
        tokio::fs::create_dir(&dir).await.map_err(|e| {
            WorkerError::workspace(format!("create {}: {}", dir.display(), e))
        })?;

        debug!(dir = %dir.display(), item_index, "Acquired workspace");

        Ok(Self {
            dir,
            token: token.to_string(),
            item_index,
            released: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn item_index(&self) -> usize {
        self.item_index
    }

    /// Path of one slide's artifact, e.g. `slide_2.mp3`.
    pub fn path_for(&self, kind: ArtifactKind, slide_index: usize) -> PathBuf {
        self.dir
            .join(format!("slide_{}.{}", slide_index, kind.extension()))
    }

    /// Concat demuxer manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join("segments.txt")
    }

    /// Joined video before it is moved to its final location.
    pub fn output_path(&self) -> PathBuf {
        self.dir.join("joined.mp4")
    }

    /// Delete the directory and everything in it.
    pub async fn release(mut self) -> WorkerResult<()> {
        self.released = true;
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => {
                debug!(dir = %self.dir.display(), "Released workspace");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WorkerError::workspace(format!(
                "remove {}: {}",
                self.dir.display(),
                e
            ))),
        }
    }

    /// Keep the directory on disk and return its path.
    pub fn retain(mut self) -> PathBuf {
        self.released = true;
        std::mem::take(&mut self.dir)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(dir = %self.dir.display(), error = %e, "Failed to clean up workspace");
            }
        }
    }
}
