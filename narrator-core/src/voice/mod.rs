pub mod elevenlabs;
pub mod mock;
pub mod provider;
pub mod retry;
pub mod types;

pub use elevenlabs::{ElevenLabs, ElevenLabsConfig};
pub use provider::TextToSpeech;
pub use retry::{RetryPolicy, RetryingClient};
pub use types::{Account, OutputFormat, Subscription, SynthesisParameters, Voice};
