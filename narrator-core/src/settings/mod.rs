pub mod config;
pub mod manager;

pub use config::{ApiSettings, ClassifierConfig, Settings};
pub use manager::{SettingsManager, DEFAULT_SETTINGS_FILE};
