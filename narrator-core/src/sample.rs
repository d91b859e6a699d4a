//! Voice auditions: the same sample texts read by several voices, run as an
//! ordinary batch so they share scheduling, failure isolation and atomic
//! writes with scene generation.

use crate::scenes::{Scene, VoiceTable};
use crate::voice::Voice;

/// One scene per (voice, text) pair, with ids `<voice>-sample-<n>` where `n`
/// counts from 1. Voices vary slowest, so each voice's samples are adjacent.
pub fn sample_scenes(voice_names: &[String], texts: &[String], emotion: &str) -> Vec<Scene> {
    voice_names
        .iter()
        .flat_map(|voice| {
            texts.iter().enumerate().map(move |(i, text)| {
                let id = format!("{}-sample-{}", voice.to_lowercase(), i + 1);
                Scene::new(id, text.clone(), voice.clone(), emotion)
                    .with_title(format!("{voice} sample {}", i + 1))
            })
        })
        .collect()
}

/// Add entries for `names` missing from `table` by looking them up, case
/// insensitively, in a fetched catalog. Returns the names found nowhere.
pub fn fill_from_catalog(table: &mut VoiceTable, names: &[String], catalog: &[Voice]) -> Vec<String> {
    let mut missing = Vec::new();
    for name in names {
        if table.resolve(name).is_ok() {
            continue;
        }
        match catalog.iter().find(|v| v.name.eq_ignore_ascii_case(name)) {
            Some(voice) => table.insert(name.clone(), voice.id.clone()),
            None => missing.push(name.clone()),
        }
    }
    missing
}
