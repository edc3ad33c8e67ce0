//! JSON-file content queue.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use slidecast_models::ContentItem;

use crate::error::{QueueError, QueueResult};

/// Fields of the typed view; each must be a string or null when present.
const TYPED_FIELDS: [&str; 4] = ["text", "image_url", "video_url", "video_name"];

/// The persisted, ordered list of content items.
///
/// Each item is kept as its original JSON object so fields the pipeline does
/// not know about, and the order of all fields, survive a write-back.
#[derive(Debug, Clone)]
pub struct ContentQueue {
    path: PathBuf,
    entries: Vec<Map<String, Value>>,
    items: Vec<ContentItem>,
}

impl ContentQueue {
    /// Load the store at `path`.
    pub async fn load(path: impl AsRef<Path>) -> QueueResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let queue = Self::from_slice(path, &bytes)?;

        info!(
            path = %path.display(),
            items = queue.len(),
            pending = queue.eligible_indices().len(),
            "Loaded content store"
        );
        Ok(queue)
    }

    /// Parse store contents that belong to `path`.
    pub fn from_slice(path: impl AsRef<Path>, bytes: &[u8]) -> QueueResult<Self> {
        let path = path.as_ref();
        let corrupt = |reason: String| QueueError::store_corrupt(path, reason);

        let root: Value = serde_json::from_slice(bytes)
            .map_err(|e| corrupt(format!("invalid JSON: {}", e)))?;

        let Value::Array(values) = root else {
            return Err(corrupt("top level is not an array".to_string()));
        };

        let mut entries = Vec::with_capacity(values.len());
        let mut items = Vec::with_capacity(values.len());

        for (index, value) in values.into_iter().enumerate() {
            let Value::Object(entry) = value else {
                return Err(corrupt(format!("item {} is not an object", index)));
            };

            for field in TYPED_FIELDS {
                match entry.get(field) {
                    None | Some(Value::Null) | Some(Value::String(_)) => {}
                    Some(other) => {
                        return Err(corrupt(format!(
                            "item {} field '{}' must be a string, got {}",
                            index, field, other
                        )));
                    }
                }
            }

            let item: ContentItem = serde_json::from_value(Value::Object(entry.clone()))
                .map_err(|e| corrupt(format!("item {}: {}", index, e)))?;

            entries.push(entry);
            items.push(item);
        }

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            items,
        })
    }

    /// Store location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in store order.
    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&ContentItem> {
        self.items.get(index)
    }

    /// An item needs processing when it has no video yet and has a source.
    pub fn is_eligible(item: &ContentItem) -> bool {
        !item.is_complete() && item.has_source()
    }

    /// Positions of all eligible items, ascending.
    pub fn eligible_indices(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| Self::is_eligible(item))
            .map(|(index, _)| index)
            .collect()
    }

    /// Whether any item still needs processing.
    pub fn has_pending(&self) -> bool {
        self.items.iter().any(Self::is_eligible)
    }

    /// Record the rendered video for one item.
    ///
    /// A video name that is already set is never replaced.
    pub fn mark_complete(&mut self, index: usize, video_name: impl Into<String>) -> QueueResult<()> {
        let len = self.items.len();
        let item = self
            .items
            .get_mut(index)
            .ok_or(QueueError::IndexOutOfRange { index, len })?;

        if let Some(existing) = item.video_name() {
            return Err(QueueError::AlreadyComplete {
                index,
                video_name: existing.to_string(),
            });
        }

        let video_name = video_name.into();
        item.video_name = Some(video_name.clone());
        self.entries[index].insert("video_name".to_string(), Value::String(video_name));

        debug!(item_index = index, "Marked item complete");
        Ok(())
    }

    /// Write the whole store back to disk.
    ///
    /// Contents go to a sibling temp file which is synced and then renamed
    /// over the store, so a crash leaves either the old or the new file.
    pub async fn persist(&self) -> QueueResult<()> {
        let values: Vec<Value> = self.entries.iter().cloned().map(Value::Object).collect();
        let mut json = serde_json::to_vec_pretty(&values)?;
        json.push(b'\n');

        let tmp_path = self.temp_path();
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        let written = async {
            file.write_all(&json).await?;
            file.sync_all().await
        }
        .await;
        drop(file);

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        debug!(path = %self.path.display(), items = self.len(), "Persisted content store");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "content.json".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(json: &str) -> QueueResult<ContentQueue> {
        ContentQueue::from_slice("content.json", json.as_bytes())
    }

    #[test]
    fn test_rejects_non_array() {
        let err = parse(r#"{"text": "x"}"#).unwrap_err();
        assert!(matches!(err, QueueError::StoreCorrupt { .. }));
    }

    #[test]
    fn test_rejects_bad_json_and_wrong_types() {
        assert!(matches!(
            parse("[{").unwrap_err(),
            QueueError::StoreCorrupt { .. }
        ));
        assert!(matches!(
            parse(r#"[{"text": 42}]"#).unwrap_err(),
            QueueError::StoreCorrupt { .. }
        ));
        assert!(matches!(
            parse(r#"["just a string"]"#).unwrap_err(),
            QueueError::StoreCorrupt { .. }
        ));
    }

    #[test]
    fn test_eligibility() {
        let queue = parse(
            r#"[
                {"text": "done", "video_name": "a_0.mp4"},
                {"text": "todo"},
                {"text": "", "image_url": null, "video_url": ""},
                {"image_url": "https://example.com/a.png", "video_name": ""}
            ]"#,
        )
        .unwrap();

        assert_eq!(queue.eligible_indices(), vec![1, 3]);
        assert!(queue.has_pending());
    }

    #[test]
    fn test_has_pending_false_when_all_done_or_empty() {
        let queue = parse(
            r#"[
                {"text": "done", "video_name": "a_0.mp4"},
                {"text": "  ", "video_url": null}
            ]"#,
        )
        .unwrap();
        assert!(!queue.has_pending());
        assert!(!parse("[]").unwrap().has_pending());
    }

    #[test]
    fn test_mark_complete_never_overwrites() {
        let mut queue = parse(r#"[{"text": "a", "video_name": "first.mp4"}, {"text": "b"}]"#).unwrap();

        let err = queue.mark_complete(0, "second.mp4").unwrap_err();
        assert!(matches!(err, QueueError::AlreadyComplete { index: 0, .. }));
        assert_eq!(queue.item(0).unwrap().video_name(), Some("first.mp4"));

        queue.mark_complete(1, "b_1.mp4").unwrap();
        assert_eq!(queue.item(1).unwrap().video_name(), Some("b_1.mp4"));

        assert!(matches!(
            queue.mark_complete(5, "x.mp4").unwrap_err(),
            QueueError::IndexOutOfRange { index: 5, len: 2 }
        ));
    }

    #[tokio::test]
    async fn test_persist_preserves_order_and_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("content.json");
        tokio::fs::write(
            &path,
            r#"[{"title": "T", "text": "hello", "video_name": null, "tags": ["a", "b"]}, {"text": "", "extra": 1}]"#,
        )
        .await
        .unwrap();

        let mut queue = ContentQueue::load(&path).await.unwrap();
        queue.mark_complete(0, "tok_0.mp4").unwrap();
        queue.persist().await.unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        let first = value[0].as_object().unwrap();
        let keys: Vec<_> = first.keys().cloned().collect();
        assert_eq!(keys, vec!["title", "text", "video_name", "tags"]);
        assert_eq!(first["video_name"], "tok_0.mp4");
        assert_eq!(value[1]["extra"], 1);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_persist_keeps_large_numbers_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("content.json");
        tokio::fs::write(
            &path,
            r#"[{"text": "a", "ref": 123456789012345678901234, "ratio": 0.10000000000000000001}]"#,
        )
        .await
        .unwrap();

        let mut queue = ContentQueue::load(&path).await.unwrap();
        queue.mark_complete(0, "tok_0.mp4").unwrap();
        queue.persist().await.unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(raw.contains("\"ref\": 123456789012345678901234"), "store was {}", raw);
        assert!(raw.contains("\"ratio\": 0.10000000000000000001"), "store was {}", raw);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = ContentQueue::load(dir.path().join("nope.json")).await.unwrap_err();
        assert!(matches!(err, QueueError::Io(_)));
    }
}
