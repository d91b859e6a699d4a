//! Static scene, voice and emotion tables.
//!
//! [`SceneCatalog::new`] is the single validated construction path: a
//! catalog that exists never references an unknown voice or emotion, never
//! repeats a scene id or output filename, and never carries empty text.

pub mod builtin;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{NarratorError, Result};
use crate::output::file_stem;
use crate::voice::provider::validate_text;
use crate::voice::SynthesisParameters;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub text: String,
    #[serde(rename = "voice")]
    pub voice_name: String,
    pub emotion: String,
}

impl Scene {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        voice_name: impl Into<String>,
        emotion: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            text: text.into(),
            voice_name: voice_name.into(),
            emotion: emotion.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Voice name to remote voice id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceTable {
    entries: BTreeMap<String, String>,
}

impl VoiceTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn resolve(&self, name: &str) -> Result<&str> {
        self.entries
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| NarratorError::not_found("voice", name))
    }

    pub fn insert(&mut self, name: impl Into<String>, voice_id: impl Into<String>) {
        self.entries.insert(name.into(), voice_id.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionProfile {
    #[serde(flatten)]
    pub params: SynthesisParameters,
    #[serde(default)]
    pub description: String,
}

impl EmotionProfile {
    pub fn new(params: SynthesisParameters, description: impl Into<String>) -> Self {
        Self {
            params,
            description: description.into(),
        }
    }
}

/// Emotion name to synthesis parameters. Parameters are range-checked on
/// construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EmotionTable {
    entries: BTreeMap<String, EmotionProfile>,
}

impl EmotionTable {
    pub fn new<I, K>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, EmotionProfile)>,
        K: Into<String>,
    {
        let mut table = BTreeMap::new();
        for (name, profile) in entries {
            let name = name.into();
            profile.params.validate().map_err(|e| {
                NarratorError::Validation(format!("emotion '{name}': {e}"))
            })?;
            table.insert(name, profile);
        }
        Ok(Self { entries: table })
    }

    pub fn resolve(&self, name: &str) -> Result<SynthesisParameters> {
        self.entries
            .get(name)
            .map(|p| p.params)
            .ok_or_else(|| NarratorError::not_found("emotion", name))
    }

    pub fn profile(&self, name: &str) -> Option<&EmotionProfile> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EmotionProfile)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SceneCatalog {
    voices: VoiceTable,
    emotions: EmotionTable,
    scenes: Vec<Scene>,
}

impl SceneCatalog {
    pub fn new(voices: VoiceTable, emotions: EmotionTable, scenes: Vec<Scene>) -> Result<Self> {
        let mut seen_ids: HashMap<&str, usize> = HashMap::new();
        let mut seen_stems: HashMap<String, &str> = HashMap::new();

        for (index, scene) in scenes.iter().enumerate() {
            if scene.id.trim().is_empty() {
                return Err(NarratorError::Validation(format!(
                    "scene #{} has an empty id",
                    index + 1
                )));
            }
            if let Some(previous) = seen_ids.insert(&scene.id, index) {
                return Err(NarratorError::Validation(format!(
                    "scene id '{}' is used by scenes #{} and #{}",
                    scene.id,
                    previous + 1,
                    index + 1
                )));
            }
            let stem = file_stem(&scene.id);
            if let Some(other) = seen_stems.insert(stem.clone(), &scene.id) {
                return Err(NarratorError::Validation(format!(
                    "scenes '{}' and '{}' would both write '{}'",
                    other, scene.id, stem
                )));
            }
            validate_text(&scene.text)
                .map_err(|e| NarratorError::Validation(format!("scene '{}': {e}", scene.id)))?;
            voices.resolve(&scene.voice_name)?;
            emotions.resolve(&scene.emotion)?;
        }

        Ok(Self {
            voices,
            emotions,
            scenes,
        })
    }

    pub fn resolve_scene(&self, id: &str) -> Result<&Scene> {
        self.scenes
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| NarratorError::not_found("scene", id))
    }

    pub fn resolve_emotion(&self, name: &str) -> Result<SynthesisParameters> {
        self.emotions.resolve(name)
    }

    /// The scenes named by `ids`, in the order given. An empty selection
    /// means every scene.
    pub fn select(&self, ids: &[String]) -> Result<Vec<Scene>> {
        if ids.is_empty() {
            return Ok(self.scenes.clone());
        }
        ids.iter()
            .map(|id| self.resolve_scene(id).cloned())
            .collect()
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn voices(&self) -> &VoiceTable {
        &self.voices
    }

    pub fn emotions(&self) -> &EmotionTable {
        &self.emotions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices() -> VoiceTable {
        VoiceTable::new([("Josh", "josh-id"), ("Rachel", "rachel-id")])
    }

    fn emotions() -> EmotionTable {
        EmotionTable::new([(
            "intense",
            EmotionProfile::new(SynthesisParameters::new(0.3, 0.7, 0.8, true), "drama"),
        )])
        .unwrap()
    }

    #[test]
    fn test_valid_catalog_resolves() {
        let catalog = SceneCatalog::new(
            voices(),
            emotions(),
            vec![Scene::new("a", "Some text", "Josh", "intense")],
        )
        .unwrap();

        assert_eq!(catalog.resolve_scene("a").unwrap().voice_name, "Josh");
        assert!(matches!(
            catalog.resolve_scene("missing"),
            Err(NarratorError::NotFound { kind: "scene", .. })
        ));
        assert_eq!(catalog.resolve_emotion("intense").unwrap().style, 0.8);
    }

    #[test]
    fn test_unknown_voice_rejected_at_load() {
        let result = SceneCatalog::new(
            voices(),
            emotions(),
            vec![Scene::new("a", "Some text", "Arnold", "intense")],
        );
        assert!(matches!(
            result,
            Err(NarratorError::NotFound { kind: "voice", name }) if name == "Arnold"
        ));
    }

    #[test]
    fn test_unknown_emotion_rejected_at_load() {
        let result = SceneCatalog::new(
            voices(),
            emotions(),
            vec![Scene::new("a", "Some text", "Josh", "whimsical")],
        );
        assert!(matches!(
            result,
            Err(NarratorError::NotFound { kind: "emotion", .. })
        ));
    }

    #[test]
    fn test_empty_text_rejected_at_load() {
        let result = SceneCatalog::new(
            voices(),
            emotions(),
            vec![Scene::new("a", "  ", "Josh", "intense")],
        );
        assert!(matches!(result, Err(NarratorError::Validation(_))));
    }

    #[test]
    fn test_colliding_filenames_rejected() {
        let result = SceneCatalog::new(
            voices(),
            emotions(),
            vec![
                Scene::new("Matrix Lobby", "One", "Josh", "intense"),
                Scene::new("matrix-lobby", "Two", "Rachel", "intense"),
            ],
        );
        assert!(matches!(result, Err(NarratorError::Validation(msg)) if msg.contains("matrix-lobby")));
    }

    #[test]
    fn test_out_of_range_emotion_rejected() {
        let result = EmotionTable::new([(
            "broken",
            EmotionProfile::new(SynthesisParameters::new(0.5, -0.1, 0.5, false), ""),
        )]);
        assert!(matches!(result, Err(NarratorError::Validation(msg)) if msg.contains("broken")));
    }

    #[test]
    fn test_select_keeps_requested_order() {
        let catalog = SceneCatalog::new(
            voices(),
            emotions(),
            vec![
                Scene::new("a", "One", "Josh", "intense"),
                Scene::new("b", "Two", "Rachel", "intense"),
            ],
        )
        .unwrap();

        let picked = catalog
            .select(&["b".to_string(), "a".to_string()])
            .unwrap();
        assert_eq!(picked[0].id, "b");
        assert_eq!(catalog.select(&[]).unwrap().len(), 2);
        assert!(catalog.select(&["zzz".to_string()]).is_err());
    }
}
