//! Imagen client for slide artwork.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collaborators::ImageGenerator;
use crate::config::{env_or, env_parse};
use crate::error::{MediaStage, WorkerError, WorkerResult};
use crate::gemini::DEFAULT_GOOGLE_API_BASE;

/// Aspect ratios the predict endpoint accepts.
const SUPPORTED_ASPECT_RATIOS: [(u32, u32); 5] = [(1, 1), (3, 4), (4, 3), (9, 16), (16, 9)];

#[derive(Debug, Clone)]
pub struct ImagenConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ImagenConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "imagen-3.0-generate-002".to_string(),
            base_url: DEFAULT_GOOGLE_API_BASE.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl ImagenConfig {
    /// Create config from environment variables. Shares `GEMINI_API_KEY`.
    pub fn from_env() -> WorkerResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| WorkerError::config_error("GEMINI_API_KEY not set"))?;

        Ok(Self {
            api_key,
            model: env_or("IMAGEN_MODEL", "imagen-3.0-generate-002"),
            base_url: env_or("GOOGLE_API_BASE", DEFAULT_GOOGLE_API_BASE),
            timeout: Duration::from_secs(env_parse("IMAGEN_TIMEOUT_SECS", 120)),
        })
    }
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
}

/// Map a pixel size onto the nearest aspect ratio label the API supports.
fn aspect_ratio_label(width: u32, height: u32) -> String {
    if width == 0 || height == 0 {
        return "1:1".to_string();
    }

    let target = width as f64 / height as f64;
    let (w, h) = SUPPORTED_ASPECT_RATIOS
        .iter()
        .copied()
        .min_by(|a, b| {
            let da = (a.0 as f64 / a.1 as f64 - target).abs();
            let db = (b.0 as f64 / b.1 as f64 - target).abs();
            da.total_cmp(&db)
        })
        .unwrap_or((1, 1));

    format!("{}:{}", w, h)
}

pub struct ImagenClient {
    config: ImagenConfig,
    client: Client,
}

impl ImagenClient {
    pub fn new(config: ImagenConfig) -> WorkerResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| WorkerError::config_error(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn from_env() -> WorkerResult<Self> {
        Self::new(ImagenConfig::from_env()?)
    }

    fn fail(msg: impl Into<String>) -> WorkerError {
        WorkerError::media_generation(MediaStage::Image, msg)
    }
}

#[async_trait]
impl ImageGenerator for ImagenClient {
    async fn generate(&self, prompt: &str, width: u32, height: u32) -> WorkerResult<Vec<u8>> {
        let url = format!(
            "{}/v1beta/models/{}:predict",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let aspect_ratio = aspect_ratio_label(width, height);
        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: aspect_ratio.clone(),
            },
        };

        info!(model = %self.config.model, aspect_ratio = %aspect_ratio, "Requesting slide image");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::fail(format!("Imagen request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::fail(format!("Imagen returned {}: {}", status, error_text)));
        }

        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| Self::fail(format!("Failed to parse Imagen response: {}", e)))?;

        let encoded = body
            .predictions
            .into_iter()
            .find_map(|p| p.bytes_base64_encoded)
            .ok_or_else(|| Self::fail("No image in Imagen response"))?;

        let bytes = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| Self::fail(format!("Invalid image payload: {}", e)))?;

        if bytes.is_empty() {
            return Err(Self::fail("Imagen returned an empty image"));
        }

        debug!(bytes = bytes.len(), "Received slide image");
        Ok(bytes)
    }
}
