//! Google Cloud Text-to-Speech client for slide narration.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collaborators::SpeechSynthesizer;
use crate::config::{env_or, env_parse};
use crate::error::{MediaStage, WorkerError, WorkerResult};

pub const DEFAULT_TTS_API_BASE: &str = "https://texttospeech.googleapis.com";

#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub api_key: String,
    pub language_code: String,
    pub voice_name: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language_code: "en-US".to_string(),
            voice_name: "en-US-Neural2-D".to_string(),
            base_url: DEFAULT_TTS_API_BASE.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl TtsConfig {
    /// Create config from environment variables.
    ///
    /// `TTS_API_KEY` takes precedence; otherwise `GEMINI_API_KEY` is used.
    pub fn from_env() -> WorkerResult<Self> {
        let api_key = std::env::var("TTS_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .map_err(|_| WorkerError::config_error("TTS_API_KEY or GEMINI_API_KEY not set"))?;

        Ok(Self {
            api_key,
            language_code: env_or("TTS_LANGUAGE_CODE", "en-US"),
            voice_name: env_or("TTS_VOICE_NAME", "en-US-Neural2-D"),
            base_url: env_or("TTS_API_BASE", DEFAULT_TTS_API_BASE),
            timeout: Duration::from_secs(env_parse("TTS_TIMEOUT_SECS", 60)),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: Option<String>,
}

pub struct TtsClient {
    config: TtsConfig,
    client: Client,
}

impl TtsClient {
    pub fn new(config: TtsConfig) -> WorkerResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| WorkerError::config_error(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn from_env() -> WorkerResult<Self> {
        Self::new(TtsConfig::from_env()?)
    }

    fn fail(msg: impl Into<String>) -> WorkerError {
        WorkerError::media_generation(MediaStage::Audio, msg)
    }
}

#[async_trait]
impl SpeechSynthesizer for TtsClient {
    async fn synthesize(&self, text: &str) -> WorkerResult<Vec<u8>> {
        let url = format!(
            "{}/v1/text:synthesize",
            self.config.base_url.trim_end_matches('/')
        );

        let request = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &self.config.language_code,
                name: &self.config.voice_name,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
        };

        info!(voice = %self.config.voice_name, chars = text.len(), "Requesting narration");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::fail(format!("TTS request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::fail(format!("TTS returned {}: {}", status, error_text)));
        }

        let body: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| Self::fail(format!("Failed to parse TTS response: {}", e)))?;

        let encoded = body
            .audio_content
            .ok_or_else(|| Self::fail("No audio in TTS response"))?;

        let bytes = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| Self::fail(format!("Invalid audio payload: {}", e)))?;

        if bytes.is_empty() {
            return Err(Self::fail("TTS returned empty audio"));
        }

        debug!(bytes = bytes.len(), "Received narration audio");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str) -> TtsClient {
        TtsClient::new(TtsConfig {
            api_key: "test-key".to_string(),
            language_code: "en-US".to_string(),
            voice_name: "en-US-Test".to_string(),
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_synthesize_decodes_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/text:synthesize"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "input": {"text": "Hello there"},
                "voice": {"name": "en-US-Test"},
                "audioConfig": {"audioEncoding": "MP3"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "audioContent": STANDARD.encode(b"mp3-bytes")
            })))
            .expect(1)
            .mount(&server)
            .await;

        let bytes = client(&server.uri()).synthesize("Hello there").await.unwrap();
        assert_eq!(bytes, b"mp3-bytes");
    }

    #[tokio::test]
    async fn test_missing_audio_is_tagged_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let err = client(&server.uri()).synthesize("Hello").await.unwrap_err();
        assert!(matches!(
            err,
            WorkerError::MediaGeneration {
                stage: MediaStage::Audio,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_http_error_is_tagged_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let err = client(&server.uri()).synthesize("Hello").await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
