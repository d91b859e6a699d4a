//! The stock voice trio, emotion profiles and demo scenes used when no
//! project file is present.

use std::collections::BTreeMap;

use super::{EmotionProfile, Scene};
use crate::voice::SynthesisParameters;

pub fn default_voices() -> BTreeMap<String, String> {
    [
        ("Josh", "TxGEqnHWrfWFTfGW9XjX"),
        ("Rachel", "XB0fDUnXU5powFXDhCwa"),
        ("Callum", "N2lVS1w4EtoT3dr4eOWO"),
    ]
    .into_iter()
    .map(|(name, id)| (name.to_string(), id.to_string()))
    .collect()
}

pub fn default_emotions() -> BTreeMap<String, EmotionProfile> {
    [
        (
            "intense",
            SynthesisParameters::new(0.3, 0.7, 0.8, true),
            "High drama, action sequences",
        ),
        (
            "cinematic",
            SynthesisParameters::new(0.5, 0.8, 0.7, true),
            "Epic scenes, visual spectacles",
        ),
        (
            "suspense",
            SynthesisParameters::new(0.4, 0.75, 0.6, true),
            "Mysterious, tense moments",
        ),
    ]
    .into_iter()
    .map(|(name, params, description)| {
        (name.to_string(), EmotionProfile::new(params, description))
    })
    .collect()
}

pub fn default_scenes() -> Vec<Scene> {
    vec![
        Scene::new(
            "interstellar-docking",
            "The Endurance spins violently against the black void of space, its massive cylindrical form silhouetted by the distant stars as Cooper desperately aligns the docking ports amid blaring emergency alarms and cascading warning lights",
            "Josh",
            "intense",
        )
        .with_title("Interstellar - Docking Scene"),
        Scene::new(
            "john-wick-fight",
            "John moves with lethal precision through the strobe-lit bathhouse, his tailored suit barely rustling as he dispatches attackers with brutal efficiency, each movement a symphony of controlled violence in the chaotic neon atmosphere",
            "Josh",
            "intense",
        )
        .with_title("John Wick - Red Circle Fight"),
        Scene::new(
            "avatar-flight",
            "Jake soars through the breathtaking alien landscape on his majestic banshee, the vibrant bioluminescent flora creating an ethereal glow as they dive between massive floating mountains in the misty Pandoran sky",
            "Rachel",
            "cinematic",
        )
        .with_title("Avatar - First Banshee Flight"),
        Scene::new(
            "matrix-lobby",
            "Neo arches his body backward in impossible slow motion, dozens of gleaming brass bullets suspended around him like deadly metallic raindrops as his black trench coat billows dramatically in the frozen moment of surreal violence",
            "Callum",
            "suspense",
        )
        .with_title("The Matrix - Lobby Scene"),
        Scene::new(
            "blade-runner-rain",
            "K stands in the relentless neon-drenched rain as Joi's shimmering holographic form glitches delicately beside him, each raindrop creating tiny crystalline distortions in her ethereal blue light under the towering urban landscape",
            "Rachel",
            "cinematic",
        )
        .with_title("Blade Runner 2049 - Hologram Rain"),
        Scene::new(
            "inception-folding",
            "The Parisian cityscape folds impossibly over itself in a breathtaking geometric transformation, ancient stone buildings curving like paper as the laws of physics surrender to the dreamlike architectural ballet",
            "Callum",
            "suspense",
        )
        .with_title("Inception - Paris Folding Scene"),
        Scene::new(
            "mad-max-sandstorm",
            "The armored war rig charges through the apocalyptic orange sandstorm, its massive tires spraying desert debris as it narrowly avoids collisions with pursuing vehicles in the chaotic, visibility-obscured frenzy",
            "Josh",
            "intense",
        )
        .with_title("Mad Max - Sandstorm Chase"),
    ]
}

/// Text used when sampling voices without explicit sample texts.
pub const DEFAULT_SAMPLE_TEXT: &str = "The starship glides silently through the cosmic void, its metallic hull reflecting the distant starlight as it approaches the mysterious alien structure.";
