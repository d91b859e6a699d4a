use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::{NarratorError, Result};
use crate::voice::OutputFormat;

/// Lower-cased, hyphenated filename stem for a scene id. Runs of anything
/// that is not ASCII alphanumeric collapse into a single hyphen.
pub fn file_stem(scene_id: &str) -> String {
    let mut stem = String::with_capacity(scene_id.len());
    let mut pending_hyphen = false;

    for c in scene_id.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !stem.is_empty() {
                stem.push('-');
            }
            pending_hyphen = false;
            stem.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if stem.is_empty() {
        stem.push_str("scene");
    }
    stem
}

/// Writes one audio file per scene under a fixed directory.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            NarratorError::Io(format!(
                "failed to create output directory {}: {e}",
                self.dir.display()
            ))
        })
    }

    pub fn path_for(&self, scene_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", file_stem(scene_id), self.format.extension()))
    }

    /// Write to a hidden sibling and rename into place, so the final path
    /// only ever holds a complete file.
    pub async fn write_atomic(&self, scene_id: &str, audio: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(scene_id);
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("scene");
        let partial = self.dir.join(format!(".{file_name}.partial"));

        if let Err(e) = fs::write(&partial, audio).await {
            let _ = fs::remove_file(&partial).await;
            return Err(NarratorError::Io(format!(
                "failed to write {}: {e}",
                partial.display()
            )));
        }
        if let Err(e) = fs::rename(&partial, &path).await {
            let _ = fs::remove_file(&partial).await;
            return Err(NarratorError::Io(format!(
                "failed to move audio into {}: {e}",
                path.display()
            )));
        }

        debug!(path = %path.display(), bytes = audio.len(), "Wrote audio");
        Ok(path)
    }
}
