//! ElevenLabs text-to-speech implementation

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::provider::{validate_text, TextToSpeech};
use super::types::{Account, OutputFormat, SynthesisParameters, Voice};
use crate::error::{NarratorError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";
pub const DEFAULT_MODEL_ID: &str = "eleven_monolingual_v1";

#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub api_key: String,
    pub base_url: String,
    pub model_id: String,
    pub output_format: OutputFormat,
    pub timeout_ms: u64,
}

impl ElevenLabsConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            output_format: OutputFormat::default(),
            timeout_ms: 60_000,
        }
    }
}

pub struct ElevenLabs {
    config: ElevenLabsConfig,
    client: Client,
}

impl ElevenLabs {
    pub fn new(config: ElevenLabsConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(NarratorError::Configuration(
                "ElevenLabs API key is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| NarratorError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Report the subscription attached to the configured key. Doubles as a
    /// credential check.
    pub async fn account(&self) -> Result<Account> {
        let url = format!("{}/user", self.base_url());
        let response = self
            .client
            .get(&url)
            .header("xi-api-key", &self.config.api_key)
            .send()
            .await?;

        let body = success_body(response).await?;
        serde_json::from_str(&body)
            .map_err(|e| NarratorError::MalformedResponse(format!("user response: {e}")))
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// The voice id is pushed as a single percent-encoded path segment.
    fn synthesis_url(&self, voice_id: &str) -> Result<Url> {
        let base_url = self.base_url();
        let mut url = Url::parse(base_url).map_err(|e| {
            NarratorError::Configuration(format!("invalid base URL '{base_url}': {e}"))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                NarratorError::Configuration(format!("base URL '{base_url}' cannot carry a path"))
            })?
            .pop_if_empty()
            .push("text-to-speech")
            .push(voice_id);
        url.query_pairs_mut()
            .append_pair("output_format", &self.config.output_format.to_string());
        Ok(url)
    }
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: &'a SynthesisParameters,
}

#[derive(Deserialize)]
struct VoicesResponse {
    voices: Vec<VoiceData>,
}

#[derive(Deserialize)]
struct VoiceData {
    voice_id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    preview_url: Option<String>,
}

impl From<VoiceData> for Voice {
    fn from(v: VoiceData) -> Self {
        Voice {
            id: v.voice_id,
            name: v.name,
            description: v.description.unwrap_or_default(),
            labels: v.labels.unwrap_or_default(),
            category: v.category,
            preview_url: v.preview_url,
        }
    }
}

fn parse_voices(body: &str) -> Result<Vec<Voice>> {
    let response: VoicesResponse = serde_json::from_str(body)
        .map_err(|e| NarratorError::MalformedResponse(format!("voices response: {e}")))?;
    Ok(response.voices.into_iter().map(Voice::from).collect())
}

/// Turn a non-success status into a `Service` error carrying the raw body.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), %body, "ElevenLabs API error");
    Err(NarratorError::Service {
        status: status.as_u16(),
        body,
    })
}

async fn success_body(response: Response) -> Result<String> {
    let response = check_status(response).await?;
    Ok(response.text().await?)
}

#[async_trait]
impl TextToSpeech for ElevenLabs {
    fn name(&self) -> &'static str {
        "elevenlabs"
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        let url = format!("{}/voices", self.base_url());
        debug!(%url, "Fetching voice catalog");

        let response = self
            .client
            .get(&url)
            .header("xi-api-key", &self.config.api_key)
            .send()
            .await?;

        let body = success_body(response).await?;
        let voices = parse_voices(&body)?;
        debug!(count = voices.len(), "Fetched voice catalog");
        Ok(voices)
    }

    async fn synthesize(
        &self,
        voice_id: &str,
        text: &str,
        params: &SynthesisParameters,
    ) -> Result<Vec<u8>> {
        validate_text(text)?;
        if voice_id.trim().is_empty() {
            return Err(NarratorError::Validation(
                "voice id must not be empty".to_string(),
            ));
        }

        let request_body = SynthesizeRequest {
            text,
            model_id: &self.config.model_id,
            voice_settings: params,
        };

        debug!(voice_id, chars = text.chars().count(), "Sending synthesis request");

        let response = self
            .client
            .post(self.synthesis_url(voice_id)?)
            .header("xi-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let bytes = check_status(response).await?.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(NarratorError::EmptyAudio);
        }
        Ok(bytes)
    }
}
