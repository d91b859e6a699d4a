use anyhow::Result;
use narrator_core::classify::{Classification, VoiceGroup};
use narrator_core::scenes::Scene;
use narrator_core::voice::{Account, Voice};
use narrator_core::RunSummary;
use serde::Serialize;

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn voice_line(voice: &Voice) -> String {
    let labels: Vec<String> = voice
        .labels
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    let mut line = format!("  {:<24} {}", voice.name, voice.id);
    if !labels.is_empty() {
        line.push_str(&format!("  [{}]", labels.join(", ")));
    }
    if !voice.description.is_empty() {
        line.push_str(&format!("\n      {}", voice.description));
    }
    line
}

pub fn print_voices(voices: &[Voice], json: bool) -> Result<()> {
    if json {
        return print_json(voices);
    }
    println!("{} voices available", voices.len());
    for voice in voices {
        println!("{}", voice_line(voice));
    }
    Ok(())
}

pub fn print_groups(groups: &[VoiceGroup], json: bool) -> Result<()> {
    if json {
        return print_json(groups);
    }
    for group in groups {
        println!("{} ({})", group.category, group.voices.len());
        for voice in &group.voices {
            println!("{}", voice_line(voice));
        }
    }
    Ok(())
}

pub fn print_classification(classification: &Classification, json: bool) -> Result<()> {
    if json {
        return print_json(classification);
    }
    println!(
        "Matched {} of {} voices",
        classification.matched.len(),
        classification.len()
    );
    for voice in &classification.matched {
        println!("{}", voice_line(voice));
    }
    if !classification.unmatched.is_empty() {
        println!("\nUnmatched:");
        for voice in &classification.unmatched {
            println!("  {:<24} {}", voice.name, voice.id);
        }
    }
    Ok(())
}

pub fn print_account(account: &Account, json: bool) -> Result<()> {
    if json {
        return print_json(account);
    }
    let subscription = &account.subscription;
    println!("API key valid");
    if let Some(name) = &account.first_name {
        println!("  User: {name}");
    }
    println!("  Tier: {}", subscription.tier);
    println!(
        "  Characters: {}/{} used ({} remaining)",
        subscription.character_count,
        subscription.character_limit,
        subscription
            .character_limit
            .saturating_sub(subscription.character_count)
    );
    Ok(())
}

pub fn print_scenes(scenes: &[Scene], json: bool) -> Result<()> {
    if json {
        return print_json(scenes);
    }
    for scene in scenes {
        println!(
            "{:<28} {:<10} {:<10} {}",
            scene.id, scene.voice_name, scene.emotion, scene.title
        );
    }
    Ok(())
}

pub fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        return print_json(summary);
    }
    print!("{summary}");
    Ok(())
}
