use async_trait::async_trait;

use super::types::{SynthesisParameters, Voice};
use crate::error::{NarratorError, Result};

/// Longest text accepted in a single synthesis request.
pub const MAX_TEXT_CHARS: usize = 5_000;

/// A remote text-to-speech service: a voice catalog plus a synthesis
/// endpoint. Each call performs exactly one request; retries are layered on
/// top by [`super::retry::RetryingClient`].
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetch the full voice catalog in one call.
    async fn list_voices(&self) -> Result<Vec<Voice>>;

    /// Synthesize `text` with the given voice, returning the raw audio body.
    async fn synthesize(
        &self,
        voice_id: &str,
        text: &str,
        params: &SynthesisParameters,
    ) -> Result<Vec<u8>>;
}

pub fn validate_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(NarratorError::Validation(
            "synthesis text must not be empty".to_string(),
        ));
    }
    let chars = text.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Err(NarratorError::Validation(format!(
            "synthesis text is {chars} characters, the limit is {MAX_TEXT_CHARS}"
        )));
    }
    Ok(())
}
