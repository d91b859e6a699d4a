use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::NarratorError;
use crate::scenes::Scene;

/// Outcome of one scene in one run. Built once, never modified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisResult {
    scene_id: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<NarratorError>,
}

impl SynthesisResult {
    pub fn succeeded(scene_id: impl Into<String>, output_path: PathBuf) -> Self {
        Self {
            scene_id: scene_id.into(),
            success: true,
            output_path: Some(output_path),
            error: None,
        }
    }

    pub fn failed(scene_id: impl Into<String>, error: NarratorError) -> Self {
        Self {
            scene_id: scene_id.into(),
            success: false,
            output_path: None,
            error: Some(error),
        }
    }

    pub fn scene_id(&self) -> &str {
        &self.scene_id
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    pub fn error(&self) -> Option<&NarratorError> {
        self.error.as_ref()
    }

    pub fn error_detail(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

/// Aggregate report of a batch run, produced after every scene has reached
/// a terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total_scenes: usize,
    pub succeeded: usize,
    /// Failed scene ids, in batch order.
    pub failed: Vec<String>,
    pub voice_distribution: BTreeMap<String, usize>,
    pub emotion_distribution: BTreeMap<String, usize>,
    pub results: Vec<SynthesisResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// `results` must hold exactly one entry per scene, in scene order.
    pub(crate) fn new(
        scenes: &[Scene],
        results: Vec<SynthesisResult>,
        started_at: DateTime<Utc>,
    ) -> Self {
        debug_assert_eq!(scenes.len(), results.len());

        let mut voice_distribution = BTreeMap::new();
        let mut emotion_distribution = BTreeMap::new();
        for scene in scenes {
            *voice_distribution
                .entry(scene.voice_name.clone())
                .or_insert(0) += 1;
            *emotion_distribution
                .entry(scene.emotion.clone())
                .or_insert(0) += 1;
        }

        let succeeded = results.iter().filter(|r| r.success).count();
        let failed = results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.scene_id.clone())
            .collect();

        Self {
            total_scenes: scenes.len(),
            succeeded,
            failed,
            voice_distribution,
            emotion_distribution,
            results,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn result(&self, scene_id: &str) -> Option<&SynthesisResult> {
        self.results.iter().find(|r| r.scene_id == scene_id)
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Generation complete: {}/{} scenes succeeded",
            self.succeeded, self.total_scenes
        )?;

        let succeeded: Vec<&SynthesisResult> = self.results.iter().filter(|r| r.success).collect();
        if !succeeded.is_empty() {
            writeln!(f, "\nSucceeded:")?;
            for result in succeeded {
                match result.output_path() {
                    Some(path) => writeln!(f, "  - {} -> {}", result.scene_id, path.display())?,
                    None => writeln!(f, "  - {}", result.scene_id)?,
                }
            }
        }

        if !self.failed.is_empty() {
            writeln!(f, "\nFailed:")?;
            for result in self.results.iter().filter(|r| !r.success) {
                writeln!(
                    f,
                    "  - {}: {}",
                    result.scene_id,
                    result.error_detail().unwrap_or_default()
                )?;
            }
        }

        writeln!(f, "\nVoice distribution:")?;
        for (voice, count) in &self.voice_distribution {
            writeln!(f, "  - {voice}: {count} scenes")?;
        }

        writeln!(f, "\nEmotion distribution:")?;
        for (emotion, count) in &self.emotion_distribution {
            writeln!(f, "  - {emotion}: {count} scenes")?;
        }

        Ok(())
    }
}
