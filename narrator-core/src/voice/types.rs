use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{NarratorError, Result};

/// A named synthesis persona from the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Attribute name (gender, accent, age, ...) to value.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

impl Voice {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            labels: BTreeMap::new(),
            category: None,
            preview_url: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

/// Voice settings sent with every synthesis request. Serialized with the
/// field names the remote service expects under `voice_settings`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynthesisParameters {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    #[serde(rename = "use_speaker_boost")]
    pub speaker_boost: bool,
}

impl SynthesisParameters {
    pub fn new(stability: f32, similarity_boost: f32, style: f32, speaker_boost: bool) -> Self {
        Self {
            stability,
            similarity_boost,
            style,
            speaker_boost,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("stability", self.stability),
            ("similarity_boost", self.similarity_boost),
            ("style", self.style),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(NarratorError::Validation(format!(
                    "{field} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for SynthesisParameters {
    fn default() -> Self {
        Self::new(0.5, 0.8, 0.7, true)
    }
}

/// Audio encoding requested from the service. The string form is the value
/// of the `output_format` query parameter.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
pub enum OutputFormat {
    #[default]
    #[strum(serialize = "mp3_44100_128")]
    #[serde(rename = "mp3_44100_128")]
    Mp3_44100_128,
    #[strum(serialize = "mp3_22050_32")]
    #[serde(rename = "mp3_22050_32")]
    Mp3_22050_32,
    #[strum(serialize = "pcm_16000")]
    #[serde(rename = "pcm_16000")]
    Pcm16000,
    #[strum(serialize = "pcm_22050")]
    #[serde(rename = "pcm_22050")]
    Pcm22050,
    #[strum(serialize = "pcm_24000")]
    #[serde(rename = "pcm_24000")]
    Pcm24000,
    #[strum(serialize = "pcm_44100")]
    #[serde(rename = "pcm_44100")]
    Pcm44100,
    #[strum(serialize = "ulaw_8000")]
    #[serde(rename = "ulaw_8000")]
    Ulaw8000,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3_44100_128 | Self::Mp3_22050_32 => "mp3",
            Self::Pcm16000 | Self::Pcm22050 | Self::Pcm24000 | Self::Pcm44100 => "pcm",
            Self::Ulaw8000 => "ulaw",
        }
    }
}

/// Account details reported by the service for the current credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default)]
    pub subscription: Subscription,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub character_count: u64,
    #[serde(default)]
    pub character_limit: u64,
}
