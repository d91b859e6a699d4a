use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::classify::{AllowlistClassifier, HeuristicClassifier, VoiceClassifier};
use crate::error::Result;
use crate::orchestrator::SchedulePolicy;
use crate::scenes::builtin::{default_emotions, default_scenes, default_voices};
use crate::scenes::{EmotionProfile, EmotionTable, Scene, SceneCatalog, VoiceTable};
use crate::voice::elevenlabs::{DEFAULT_BASE_URL, DEFAULT_MODEL_ID};
use crate::voice::{ElevenLabsConfig, OutputFormat, RetryPolicy};

/// Project settings, read from `narrator.toml`. Every field has a default so
/// a partial file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_model_id")]
    pub model_id: String,

    #[serde(default)]
    pub output_format: OutputFormat,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// `KEY=value` file holding `ELEVENLABS_API_KEY`.
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,

    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub schedule: SchedulePolicy,

    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Voice name to remote voice id.
    #[serde(default = "default_voices")]
    pub voices: BTreeMap<String, String>,

    #[serde(default = "default_emotions")]
    pub emotions: BTreeMap<String, EmotionProfile>,

    #[serde(default = "default_scenes")]
    pub scenes: Vec<Scene>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Which classifier `narrator classify` uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierConfig {
    Heuristic {
        #[serde(default)]
        indicator_terms: Vec<String>,
        #[serde(default)]
        label_predicates: BTreeMap<String, String>,
    },
    Allowlist {
        voice_ids: Vec<String>,
    },
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("audio")
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from(".env")
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    60_000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            output_format: OutputFormat::default(),
            output_dir: default_output_dir(),
            credentials_file: default_credentials_file(),
            api: ApiSettings::default(),
            schedule: SchedulePolicy::default(),
            retry: RetryPolicy::default(),
            classifier: ClassifierConfig::default(),
            voices: default_voices(),
            emotions: default_emotions(),
            scenes: default_scenes(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::Heuristic {
            indicator_terms: Vec::new(),
            label_predicates: BTreeMap::new(),
        }
    }
}

impl ClassifierConfig {
    pub fn build(&self) -> Box<dyn VoiceClassifier> {
        match self {
            Self::Heuristic {
                indicator_terms,
                label_predicates,
            } => Box::new(HeuristicClassifier::new(
                indicator_terms.iter().cloned(),
                label_predicates.clone(),
            )),
            Self::Allowlist { voice_ids } => {
                Box::new(AllowlistClassifier::new(voice_ids.iter().cloned()))
            }
        }
    }
}

impl Settings {
    /// Validate the configured tables into a catalog.
    pub fn catalog(&self) -> Result<SceneCatalog> {
        SceneCatalog::new(
            self.voice_table(),
            EmotionTable::new(self.emotions.clone())?,
            self.scenes.clone(),
        )
    }

    pub fn voice_table(&self) -> VoiceTable {
        VoiceTable::new(self.voices.clone())
    }

    pub fn elevenlabs_config(&self, api_key: String) -> ElevenLabsConfig {
        ElevenLabsConfig {
            api_key,
            base_url: self.api.base_url.trim_end_matches('/').to_string(),
            model_id: self.model_id.clone(),
            output_format: self.output_format,
            timeout_ms: self.api.timeout_ms,
        }
    }
}
