use serde::Serialize;

use crate::voice::Voice;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceGroup {
    pub category: String,
    pub voices: Vec<Voice>,
}

/// Group voices by their `"<gender> - <age>"` labels. Groups appear in the
/// order their first voice appears in the catalog.
pub fn categorize(voices: &[Voice]) -> Vec<VoiceGroup> {
    let mut groups: Vec<VoiceGroup> = Vec::new();

    for voice in voices {
        let category = format!(
            "{} - {}",
            voice.label("gender").unwrap_or("unknown"),
            voice.label("age").unwrap_or("unknown")
        );
        match groups.iter_mut().find(|g| g.category == category) {
            Some(group) => group.voices.push(voice.clone()),
            None => groups.push(VoiceGroup {
                category,
                voices: vec![voice.clone()],
            }),
        }
    }

    groups
}
