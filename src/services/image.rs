//! Image generation against an OpenAI-compatible images endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ImageConfig;
use crate::ConciergeError;

#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    /// Pixel size like `1024x1024`; falls back to the configured default.
    pub size: Option<String>,
}

/// A generated asset: a hosted URL, inline base64 data, or both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedAsset {
    pub url: Option<String>,
    pub inline: Option<String>,
}

/// Service trait for image generation.
#[async_trait]
pub trait ImageService: Send + Sync {
    async fn generate(&self, request: ImageRequest) -> Result<GeneratedAsset, ConciergeError>;

    fn is_available(&self) -> bool;
}

#[derive(Serialize)]
struct ImageBody {
    prompt: String,
    size: String,
    n: u8,
}

#[derive(Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

pub struct OpenAiImageService {
    config: Option<ImageConfig>,
    http: reqwest::Client,
}

impl OpenAiImageService {
    pub fn new(config: Option<ImageConfig>) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ImageService for OpenAiImageService {
    async fn generate(&self, request: ImageRequest) -> Result<GeneratedAsset, ConciergeError> {
        let config = self.config.as_ref().ok_or_else(|| {
            ConciergeError::Unavailable("image backend is not configured".to_string())
        })?;

        let url = format!("{}/v1/images/generations", config.base_url);
        let body = ImageBody {
            prompt: request.prompt,
            size: request.size.unwrap_or_else(|| config.size.clone()),
            n: 1,
        };

        let mut http_req = self.http.post(&url).json(&body);
        if let Some(ref key) = config.api_key {
            http_req = http_req.bearer_auth(key);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| ConciergeError::Image(format!("image request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ConciergeError::Image(format!(
                "image API error {status}: {body_text}"
            )));
        }

        let parsed: ImageResponse = response
            .json()
            .await
            .map_err(|e| ConciergeError::Image(format!("malformed image response: {e}")))?;

        let datum = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ConciergeError::Image("empty image response".to_string()))?;

        if datum.url.is_none() && datum.b64_json.is_none() {
            return Err(ConciergeError::Image(
                "image response carried neither a URL nor inline data".to_string(),
            ));
        }

        Ok(GeneratedAsset {
            url: datum.url,
            inline: datum.b64_json,
        })
    }

    fn is_available(&self) -> bool {
        self.config.is_some()
    }
}
