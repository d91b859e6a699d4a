use crate::settings::config::Settings;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_SETTINGS_FILE: &str = "narrator.toml";

/// Loaded project settings plus the file they came from. Relative paths in
/// the settings resolve against that file's directory.
#[derive(Debug, Clone)]
pub struct SettingsManager {
    settings_path: PathBuf,
    settings: Settings,
}

impl SettingsManager {
    /// Load `explicit` if given, which must exist; otherwise `narrator.toml`
    /// in the working directory, falling back to built-in defaults when that
    /// is absent.
    pub fn discover(explicit: Option<PathBuf>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    bail!("Settings file not found: {path:?}");
                }
                Self::from_path(path)
            }
            None => Self::from_path(PathBuf::from(DEFAULT_SETTINGS_FILE)),
        }
    }

    /// Load settings from `path`, or defaults when the file does not exist.
    pub fn from_path(path: PathBuf) -> Result<Self> {
        let settings = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {path:?}"))?;
            let settings: Settings = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse settings in {path:?}"))?;
            settings
                .schedule
                .validate()
                .with_context(|| format!("Invalid schedule in {path:?}"))?;
            settings
        } else {
            debug!(path = %path.display(), "No settings file, using defaults");
            Settings::default()
        };

        Ok(Self {
            settings_path: path,
            settings,
        })
    }

    /// Write the default settings to `path` so they can be edited. Refuses
    /// to overwrite an existing file unless `force` is set.
    pub fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!("Settings file already exists: {path:?}");
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {parent:?}"))?;
        }
        let contents = toml::to_string_pretty(&Settings::default())
            .context("Failed to serialize default settings")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write default settings to {path:?}"))?;
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.settings_path.parent() {
            Some(base) if !base.as_os_str().is_empty() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.settings.output_dir)
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.resolve_path(&self.settings.credentials_file)
    }
}
