use std::collections::BTreeSet;

use super::VoiceClassifier;
use crate::voice::Voice;

/// Matches exactly the voices whose ids were listed.
#[derive(Debug, Clone, Default)]
pub struct AllowlistClassifier {
    voice_ids: BTreeSet<String>,
}

impl AllowlistClassifier {
    pub fn new<I, S>(voice_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            voice_ids: voice_ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl VoiceClassifier for AllowlistClassifier {
    fn matches(&self, voice: &Voice) -> bool {
        self.voice_ids.contains(&voice.id)
    }
}
