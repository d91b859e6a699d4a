use std::path::Path;

use tracing::debug;

use crate::error::{NarratorError, Result};

pub const API_KEY_VAR: &str = "ELEVENLABS_API_KEY";

/// Read the API key from a `KEY=value` file, falling back to the process
/// environment. A missing or blank key is a configuration error.
pub fn load_api_key(env_file: &Path) -> Result<String> {
    let from_file = read_key_from_file(env_file)?;
    let from_env = std::env::var(API_KEY_VAR).ok();
    resolve_api_key(from_file, from_env).map_err(|_| {
        NarratorError::Configuration(format!(
            "{API_KEY_VAR} not found in {} or the environment",
            env_file.display()
        ))
    })
}

fn read_key_from_file(path: &Path) -> Result<Option<String>> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) if e.not_found() => {
            debug!(path = %path.display(), "Credentials file not found");
            return Ok(None);
        }
        Err(e) => {
            return Err(NarratorError::Configuration(format!(
                "failed to read {}: {e}",
                path.display()
            )))
        }
    };

    for entry in entries {
        let (key, value) = entry.map_err(|e| {
            NarratorError::Configuration(format!("failed to parse {}: {e}", path.display()))
        })?;
        if key == API_KEY_VAR {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

fn resolve_api_key(from_file: Option<String>, from_env: Option<String>) -> Result<String> {
    [from_file, from_env]
        .into_iter()
        .flatten()
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
        .ok_or_else(|| NarratorError::Configuration(format!("{API_KEY_VAR} is missing")))
}
