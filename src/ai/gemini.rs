use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{EstimateError, GenerativeModel, ImagePart};
use crate::config::GeminiConfig;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ReplyContent>,
}

#[derive(Debug, Deserialize)]
struct ReplyContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// `generateContent` client for the Gemini REST API.
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn map_status(status: StatusCode, body: &str) -> EstimateError {
        let message = serde_json::from_str::<GenerateResponse>(body)
            .ok()
            .and_then(|r| r.error)
            .map_or_else(|| body.to_string(), |e| e.message);
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                EstimateError::Upstream(format!("quota exceeded: {message}"))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                EstimateError::Upstream(format!("credentials rejected ({status}): {message}"))
            }
            _ => EstimateError::Upstream(format!("HTTP {status}: {message}")),
        }
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(skip(self, prompt, image), fields(model = %self.model, has_image = image.is_some()))]
    async fn generate(
        &self,
        prompt: &str,
        image: Option<&ImagePart>,
    ) -> Result<String, EstimateError> {
        let api_key = self.api_key.as_deref().ok_or(EstimateError::MissingApiKey)?;

        let mut parts = vec![Part::Text { text: prompt }];
        if let Some(img) = image {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: &img.mime_type,
                    data: STANDARD.encode(&img.data),
                },
            });
        }
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig { temperature: 0.2 },
        };

        debug!("sending generateContent request");
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EstimateError::Timeout(self.timeout)
                } else {
                    EstimateError::Upstream(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| EstimateError::Upstream(format!("read body: {e}")))?;

        if !status.is_success() {
            error!(%status, "gemini returned an error status");
            return Err(Self::map_status(status, &text));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| EstimateError::Upstream(format!("unexpected response envelope: {e}")))?;
        if let Some(err) = parsed.error {
            return Err(EstimateError::Upstream(err.message));
        }

        let reply: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if reply.trim().is_empty() {
            return Err(EstimateError::Malformed("model returned no text".into()));
        }
        Ok(reply)
    }
}
