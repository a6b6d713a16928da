use crate::circuit_breaker::{create_upstream_circuit_breaker, UpstreamBreaker};
use crate::config::Config;
use crate::errors::UpstreamError;
use base64::Engine;
use failsafe::futures::CircuitBreaker;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for the Gemini `generateContent` REST API.
///
/// Every call is a single attempt at temperature 0. Failures are returned to
/// the caller as `UpstreamError`; nothing is retried or defaulted here.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    breaker: UpstreamBreaker,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
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
    Text {
        text: &'a str,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl GeminiClient {
    /// Creates a new `GeminiClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root, e.g. `https://generativelanguage.googleapis.com`.
    /// * `api_key` - Key sent in the `x-goog-api-key` header.
    /// * `model` - Model name, e.g. `gemini-2.5-flash`.
    /// * `timeout` - Per-request timeout.
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                UpstreamError::Request(format!("Failed to create Gemini client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            breaker: create_upstream_circuit_breaker(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, UpstreamError> {
        Self::new(
            config.gemini_base_url.clone(),
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            Duration::from_secs(config.upstream_timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends a text-only prompt and returns the raw model text.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, UpstreamError> {
        self.generate(vec![Part::Text { text: prompt }]).await
    }

    /// Sends a binary payload (image, PDF, audio) followed by the prompt.
    ///
    /// # Arguments
    ///
    /// * `prompt` - Instruction text.
    /// * `data` - Raw file bytes; base64-encoded for transport.
    /// * `mime_type` - Already resolved against the relevant allow-list.
    pub async fn generate_with_media(
        &self,
        prompt: &str,
        data: &[u8],
        mime_type: &str,
    ) -> Result<String, UpstreamError> {
        let inline = Part::Inline {
            inline_data: InlineData {
                mime_type,
                data: base64::engine::general_purpose::STANDARD.encode(data),
            },
        };
        self.generate(vec![inline, Part::Text { text: prompt }]).await
    }

    async fn generate(&self, parts: Vec<Part<'_>>) -> Result<String, UpstreamError> {
        let request = GenerateContentRequest {
            contents: vec![Content { role: "user", parts }],
            generation_config: GenerationConfig { temperature: 0.0 },
        };

        match self.breaker.call(self.send(&request)).await {
            Ok(text) => Ok(text),
            Err(failsafe::Error::Inner(e)) => Err(e),
            Err(failsafe::Error::Rejected) => {
                tracing::warn!("Gemini circuit open, rejecting call");
                Err(UpstreamError::Rejected)
            }
        }
    }

    async fn send(&self, request: &GenerateContentRequest<'_>) -> Result<String, UpstreamError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        tracing::info!("Calling Gemini model {}", self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Gemini returned error {}: {}", status, error_text);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let data: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        let text = data.into_text().ok_or(UpstreamError::EmptyResponse)?;
        tracing::debug!("Gemini replied with {} chars", text.len());
        Ok(text)
    }
}
