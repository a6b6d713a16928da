use crate::circuit_breaker::{create_upstream_circuit_breaker, UpstreamBreaker};
use crate::config::Config;
use crate::errors::UpstreamError;
use base64::Engine;
use failsafe::futures::CircuitBreaker;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::LazyLock;
use std::time::Duration;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[a-zA-Z]*").expect("code fence pattern is valid"));

static LINE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:#{1,6}|[-*+•]|\d+[.)])\s+").expect("line marker pattern is valid")
});

static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*_`~]+").expect("emphasis pattern is valid"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Turns markdown-ish model output into plain sentences for synthesis.
///
/// Drops code fences, headings, bullet and list markers and emphasis
/// characters, then collapses runs of whitespace.
pub fn normalize_for_speech(text: &str) -> String {
    let text = CODE_FENCE.replace_all(text, " ");
    let text = LINE_MARKER.replace_all(&text, "");
    let text = EMPHASIS.replace_all(&text, "");
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Client for the Google Cloud Text-to-Speech `text:synthesize` endpoint.
#[derive(Clone)]
pub struct SpeechClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    language_code: String,
    voice: Option<String>,
    breaker: UpstreamBreaker,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl SpeechClient {
    pub fn new(
        base_url: String,
        api_key: String,
        language_code: String,
        voice: Option<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                UpstreamError::Request(format!("Failed to create speech client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            language_code,
            voice,
            breaker: create_upstream_circuit_breaker(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, UpstreamError> {
        Self::new(
            config.tts_base_url.clone(),
            config.tts_api_key.clone(),
            config.tts_language_code.clone(),
            config.tts_voice.clone(),
            Duration::from_secs(config.upstream_timeout_secs),
        )
    }

    /// Synthesizes `text` to MP3 audio.
    ///
    /// The text is normalized first; an input that normalizes to nothing is
    /// rejected without a network call.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, UpstreamError> {
        let spoken = normalize_for_speech(text);
        if spoken.is_empty() {
            return Err(UpstreamError::EmptyResponse);
        }

        match self.breaker.call(self.send(&spoken)).await {
            Ok(audio) => Ok(audio),
            Err(failsafe::Error::Inner(e)) => Err(e),
            Err(failsafe::Error::Rejected) => {
                tracing::warn!("Speech circuit open, rejecting call");
                Err(UpstreamError::Rejected)
            }
        }
    }

    async fn send(&self, text: &str) -> Result<Vec<u8>, UpstreamError> {
        let url = format!("{}/v1/text:synthesize", self.base_url);
        tracing::info!("Synthesizing {} chars of speech", text.len());

        let voice = VoiceSelection {
            language_code: &self.language_code,
            name: self.voice.as_deref(),
        };
        let body = json!({
            "input": { "text": text },
            "voice": voice,
            "audioConfig": { "audioEncoding": "MP3" }
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Speech API returned error {}: {}", status, error_text);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let data: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        let encoded = data
            .audio_content
            .filter(|a| !a.is_empty())
            .ok_or(UpstreamError::EmptyResponse)?;

        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| UpstreamError::Decode(format!("audioContent is not base64: {}", e)))
    }
}
