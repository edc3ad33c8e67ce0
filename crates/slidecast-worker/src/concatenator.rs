//! Ordered join of rendered slide segments into the final video.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use slidecast_media::{move_file, write_concat_manifest, MediaEncoder};
use slidecast_models::RenderedSlide;

use crate::error::{WorkerError, WorkerResult};
use crate::workspace::Workspace;

pub struct Concatenator {
    encoder: Arc<dyn MediaEncoder>,
}

impl Concatenator {
    pub fn new(encoder: Arc<dyn MediaEncoder>) -> Self {
        Self { encoder }
    }

    /// Join `rendered` in ascending slide index and publish to `output_path`.
    ///
    /// The join happens inside the workspace; `output_path` only appears once
    /// the joined file is complete.
    pub async fn concatenate(
        &self,
        mut rendered: Vec<RenderedSlide>,
        workspace: &Workspace,
        output_path: &Path,
    ) -> WorkerResult<PathBuf> {
        if rendered.is_empty() {
            return Err(WorkerError::concatenation("no segments to join"));
        }

        rendered.sort_by_key(|r| r.index);

        let mut seen = HashSet::with_capacity(rendered.len());
        for slide in &rendered {
            if !seen.insert(slide.index) {
                return Err(WorkerError::concatenation(format!(
                    "duplicate segment for slide {}",
                    slide.index
                )));
            }
        }

        let segments: Vec<PathBuf> = rendered.into_iter().map(|r| r.segment_path).collect();
        let manifest = workspace.manifest_path();
        write_concat_manifest(&manifest, &segments)
            .await
            .map_err(|e| WorkerError::concatenation(format!("manifest: {}", e)))?;

        let joined = workspace.output_path();
        self.encoder
            .concat(&manifest, &joined)
            .await
            .map_err(|e| WorkerError::concatenation(e.to_string()))?;

        if !tokio::fs::try_exists(&joined).await.unwrap_or(false) {
            return Err(WorkerError::concatenation("encoder produced no output"));
        }

        move_file(&joined, output_path)
            .await
            .map_err(|e| WorkerError::concatenation(format!("publish: {}", e)))?;

        info!(
            segments = segments.len(),
            output = %output_path.display(),
            "Joined slide segments"
        );
        Ok(output_path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use slidecast_media::MediaResult;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Joins by appending segment bytes in manifest order.
    #[derive(Default)]
    struct CatEncoder {
        manifest: Mutex<String>,
    }

    #[async_trait]
    impl MediaEncoder for CatEncoder {
        async fn probe_duration(&self, _audio: &Path) -> MediaResult<f64> {
            Ok(1.0)
        }

        async fn render_segment(&self, _i: &Path, _a: &Path, _d: f64, _o: &Path) -> MediaResult<()> {
            Ok(())
        }

        async fn concat(&self, manifest: &Path, output: &Path) -> MediaResult<()> {
            let text = tokio::fs::read_to_string(manifest).await?;
            let mut joined = Vec::new();
            for line in text.lines() {
                let path = line
                    .trim_start_matches("file '")
                    .trim_end_matches('\'');
                joined.extend(tokio::fs::read(path).await?);
            }
            tokio::fs::write(output, joined).await?;
            *self.manifest.lock().unwrap() = text;
            Ok(())
        }
    }

    async fn segment(ws: &Workspace, index: usize) -> RenderedSlide {
        let path = ws.dir().join(format!("slide_{}.mp4", index));
        tokio::fs::write(&path, format!("[{}]", index)).await.unwrap();
        RenderedSlide::new(index, path)
    }

    #[tokio::test]
    async fn test_joins_in_index_order() {
        let root = TempDir::new().unwrap();
        let ws = Workspace::acquire(root.path(), "t", 0).await.unwrap();
        let rendered = vec![
            segment(&ws, 2).await,
            segment(&ws, 0).await,
            segment(&ws, 3).await,
            segment(&ws, 1).await,
        ];
        let encoder = Arc::new(CatEncoder::default());
        let output = root.path().join("t_0.mp4");

        let published = Concatenator::new(encoder.clone())
            .concatenate(rendered, &ws, &output)
            .await
            .unwrap();

        assert_eq!(published, output);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "[0][1][2][3]");
        assert!(!ws.output_path().exists());
        assert_eq!(encoder.manifest.lock().unwrap().lines().count(), 4);
    }

    #[tokio::test]
    async fn test_rejects_duplicate_index() {
        let root = TempDir::new().unwrap();
        let ws = Workspace::acquire(root.path(), "t", 0).await.unwrap();
        let rendered = vec![segment(&ws, 0).await, segment(&ws, 0).await];
        let output = root.path().join("t_0.mp4");

        let err = Concatenator::new(Arc::new(CatEncoder::default()))
            .concatenate(rendered, &ws, &output)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::Concatenation(_)));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_missing_segment_fails() {
        let root = TempDir::new().unwrap();
        let ws = Workspace::acquire(root.path(), "t", 0).await.unwrap();
        let rendered = vec![RenderedSlide::new(0, ws.dir().join("slide_0.mp4"))];
        let output = root.path().join("t_0.mp4");

        let err = Concatenator::new(Arc::new(CatEncoder::default()))
            .concatenate(rendered, &ws, &output)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::Concatenation(_)));
        assert!(!output.exists());
    }
}
