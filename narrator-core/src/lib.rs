pub mod classify;
pub mod credentials;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod sample;
pub mod scenes;
pub mod settings;
pub mod voice;

// Public library API. Everything is public, but these are the types most
// callers need.
pub use classify::{Classification, VoiceClassifier};
pub use error::{NarratorError, Result};
pub use orchestrator::{
    BatchEvent, CancelHandle, Orchestrator, RunSummary, SceneState, SchedulePolicy,
    SynthesisResult,
};
pub use scenes::{Scene, SceneCatalog};
pub use settings::{Settings, SettingsManager};
pub use voice::{RetryingClient, TextToSpeech, Voice};
