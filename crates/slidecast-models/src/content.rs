//! Content item model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One entry of the persisted content queue.
///
/// An item's identity is its position in the stored sequence, so there is no
/// id field. Fields not listed here are kept by the queue store but are not
/// part of the typed view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ContentItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// File name of the rendered video. Once set the item is complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_name: Option<String>,
}

impl ContentItem {
    /// Source text, if non-blank.
    pub fn text(&self) -> Option<&str> {
        non_blank(&self.text)
    }

    /// Source image URL, if non-blank.
    pub fn image_url(&self) -> Option<&str> {
        non_blank(&self.image_url)
    }

    /// Source video URL, if non-blank.
    pub fn video_url(&self) -> Option<&str> {
        non_blank(&self.video_url)
    }

    /// Rendered video name, if non-blank.
    pub fn video_name(&self) -> Option<&str> {
        non_blank(&self.video_name)
    }

    /// Whether a video has already been rendered for this item.
    pub fn is_complete(&self) -> bool {
        self.video_name().is_some()
    }

    /// Whether there is anything to build a video from.
    pub fn has_source(&self) -> bool {
        self.text().is_some() || self.image_url().is_some() || self.video_url().is_some()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_count_as_unset() {
        let item = ContentItem {
            text: Some("   ".to_string()),
            image_url: Some(String::new()),
            video_url: None,
            video_name: Some(String::new()),
        };

        assert!(!item.has_source());
        assert!(!item.is_complete());
    }

    #[test]
    fn test_any_source_field_is_enough() {
        let item = ContentItem {
            video_url: Some("https://example.com/v.mp4".to_string()),
            ..Default::default()
        };
        assert!(item.has_source());
        assert_eq!(item.video_url(), Some("https://example.com/v.mp4"));
    }

    #[test]
    fn test_deserialize_with_nulls_and_missing_fields() {
        let item: ContentItem =
            serde_json::from_str(r#"{"text": "hello", "video_name": null}"#).unwrap();
        assert_eq!(item.text(), Some("hello"));
        assert!(item.image_url.is_none());
        assert!(!item.is_complete());
    }
}
