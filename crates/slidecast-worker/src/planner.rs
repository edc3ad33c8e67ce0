//! Slide planning via the text-planning collaborator.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use slidecast_models::{SlidePlan, MAX_SLIDES, MIN_SLIDES};

use crate::collaborators::TextPlanner;
use crate::error::{WorkerError, WorkerResult};

/// Turns a content item's raw inputs into a validated [`SlidePlan`].
pub struct SlidePlanner {
    planner: Arc<dyn TextPlanner>,
}

impl SlidePlanner {
    pub fn new(planner: Arc<dyn TextPlanner>) -> Self {
        Self { planner }
    }

    /// Ask for a plan and validate its shape. One collaborator call, no retries.
    pub async fn plan(
        &self,
        text: Option<&str>,
        image_url: Option<&str>,
        video_url: Option<&str>,
    ) -> WorkerResult<SlidePlan> {
        let prompt = build_prompt(text, image_url, video_url);
        let raw = self.planner.generate(&prompt).await?;

        let plan = parse_plan(&raw).inspect_err(|e| {
            warn!(error = %e, "Rejected slide plan");
        })?;

        info!(slides = plan.len(), "Slide plan ready");
        Ok(plan)
    }
}

/// Build the planning prompt for one content item.
pub fn build_prompt(text: Option<&str>, image_url: Option<&str>, video_url: Option<&str>) -> String {
    let schema = schemars::schema_for!(SlidePlan);
    let schema_json = serde_json::to_string_pretty(&schema).unwrap_or_default();

    let mut sources = String::new();
    if let Some(text) = text {
        sources.push_str(&format!("Text:\n{}\n\n", text.trim()));
    }
    if let Some(url) = image_url {
        sources.push_str(&format!("Reference image: {}\n\n", url.trim()));
    }
    if let Some(url) = video_url {
        sources.push_str(&format!("Reference video: {}\n\n", url.trim()));
    }

    format!(
        r#"You are writing a short vertical explainer video made of still slides with voiceover.

Source material:

{sources}Produce between {min} and {max} slides that together cover the source material.

For every slide provide:
- "heading": a short on-screen title
- "description": one or two sentences describing what the slide shows
- "imagePrompt": a detailed prompt for a portrait (9:16) illustration of the slide
- "speakText": the narration spoken over the slide

The narration of all slides is played back to back and must read as one continuous
story: each slide picks up where the previous one ended, with no greetings, recaps
or sign-offs between slides.

Respond with JSON only, matching this schema:

{schema_json}
"#,
        sources = sources,
        min = MIN_SLIDES,
        max = MAX_SLIDES,
        schema_json = schema_json,
    )
}

/// Parse and validate a raw planner response.
pub fn parse_plan(raw: &str) -> WorkerResult<SlidePlan> {
    let body = strip_code_fence(raw);

    let value: Value = serde_json::from_str(body)
        .map_err(|e| WorkerError::planning(format!("Failed to parse plan JSON: {}", e)))?;

    match value.get("slides") {
        Some(Value::Array(_)) => {}
        Some(_) => return Err(WorkerError::planning("\"slides\" is not an array")),
        None => return Err(WorkerError::planning("Missing \"slides\" array")),
    }

    let plan: SlidePlan = serde_json::from_value(value)
        .map_err(|e| WorkerError::planning(format!("Malformed slide: {}", e)))?;

    plan.validate()
        .map_err(|e| WorkerError::planning(e.to_string()))?;

    Ok(plan)
}

/// Remove a surrounding markdown code fence (```` ``` ```` or ```` ```json ````).
fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    // Drop the info string, if any: up to the end of the opening line, or
    // up to the JSON body when the whole reply is on one line.
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn slide_json(n: usize) -> String {
        let slides: Vec<Value> = (0..n)
            .map(|i| {
                serde_json::json!({
                    "heading": format!("Heading {}", i),
                    "description": "desc",
                    "imagePrompt": "prompt",
                    "speakText": "narration",
                })
            })
            .collect();
        serde_json::json!({ "slides": slides }).to_string()
    }

    struct CannedPlanner {
        reply: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextPlanner for CannedPlanner {
        async fn generate(&self, _prompt: &str) -> WorkerResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn test_parse_plan_accepts_fenced_json() {
        let raw = format!("```json\n{}\n```", slide_json(5));
        let plan = parse_plan(&raw).unwrap();
        assert_eq!(plan.len(), 5);
        assert_eq!(plan.slides[0].heading, "Heading 0");
    }

    #[test]
    fn test_parse_plan_accepts_bare_fence() {
        let raw = format!("```\n{}\n```", slide_json(4));
        assert_eq!(parse_plan(&raw).unwrap().len(), 4);
    }

    #[test]
    fn test_parse_plan_accepts_single_line_fence() {
        let raw = format!("```json{}```", slide_json(4));
        assert_eq!(parse_plan(&raw).unwrap().len(), 4);

        let raw = format!("```{}```", slide_json(5));
        assert_eq!(parse_plan(&raw).unwrap().len(), 5);
    }

    #[test]
    fn test_parse_plan_rejects_bad_counts() {
        assert!(matches!(parse_plan(&slide_json(3)), Err(WorkerError::Planning(_))));
        assert!(matches!(parse_plan(&slide_json(7)), Err(WorkerError::Planning(_))));
        assert!(parse_plan(&slide_json(6)).is_ok());
    }

    #[test]
    fn test_parse_plan_rejects_missing_slides() {
        let err = parse_plan(r#"{"pages": []}"#).unwrap_err();
        assert!(err.to_string().contains("slides"));

        let err = parse_plan(r#"{"slides": "four"}"#).unwrap_err();
        assert!(matches!(err, WorkerError::Planning(_)));
    }

    #[test]
    fn test_parse_plan_rejects_empty_field() {
        let mut value: Value = serde_json::from_str(&slide_json(4)).unwrap();
        value["slides"][2]["speakText"] = Value::String("   ".to_string());

        let err = parse_plan(&value.to_string()).unwrap_err();
        assert!(matches!(err, WorkerError::Planning(_)));
    }

    #[test]
    fn test_parse_plan_rejects_missing_field() {
        let mut value: Value = serde_json::from_str(&slide_json(4)).unwrap();
        value["slides"][1]
            .as_object_mut()
            .unwrap()
            .remove("imagePrompt");

        assert!(parse_plan(&value.to_string()).is_err());
    }

    #[test]
    fn test_parse_plan_rejects_non_json() {
        assert!(matches!(
            parse_plan("Sure! Here are your slides."),
            Err(WorkerError::Planning(_))
        ));
    }

    #[test]
    fn test_prompt_mentions_sources_and_bounds() {
        let prompt = build_prompt(Some("Tides explained"), None, Some("https://v.example/x"));
        assert!(prompt.contains("Tides explained"));
        assert!(prompt.contains("https://v.example/x"));
        assert!(!prompt.contains("Reference image"));
        assert!(prompt.contains("between 4 and 6 slides"));
        assert!(prompt.contains("continuous"));
        assert!(prompt.contains("speakText"));
    }

    #[tokio::test]
    async fn test_plan_calls_collaborator_once() {
        let canned = Arc::new(CannedPlanner {
            reply: slide_json(4),
            calls: AtomicUsize::new(0),
        });
        let planner = SlidePlanner::new(canned.clone());

        let plan = planner.plan(Some("text"), None, None).await.unwrap();
        assert_eq!(plan.len(), 4);
        assert_eq!(canned.calls.load(Ordering::SeqCst), 1);
    }
}
