use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use narrator_core::classify::{AllowlistClassifier, HeuristicClassifier, VoiceClassifier};
use narrator_core::credentials::load_api_key;
use narrator_core::orchestrator::BatchEvent;
use narrator_core::sample::{fill_from_catalog, sample_scenes};
use narrator_core::scenes::builtin::DEFAULT_SAMPLE_TEXT;
use narrator_core::scenes::{EmotionTable, Scene, VoiceTable};
use narrator_core::settings::{SettingsManager, DEFAULT_SETTINGS_FILE};
use narrator_core::voice::{ElevenLabs, RetryingClient, TextToSpeech};
use narrator_core::{Orchestrator, RunSummary};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::report;

pub fn init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));
    SettingsManager::write_default(&path, force)?;
    println!("Wrote default settings to {}", path.display());
    Ok(())
}

/// Settings plus the command-line overrides shared by every subcommand.
pub struct Session {
    manager: SettingsManager,
    env_file: Option<PathBuf>,
    json: bool,
}

impl Session {
    pub fn load(config: Option<PathBuf>, env_file: Option<PathBuf>, json: bool) -> Result<Self> {
        let manager = SettingsManager::discover(config)?;
        info!(path = %manager.path().display(), "Settings loaded");
        Ok(Self {
            manager,
            env_file,
            json,
        })
    }

    /// Build the remote client. A missing credential fails here, before any
    /// network call.
    fn elevenlabs(&self) -> Result<ElevenLabs> {
        let env_file = self
            .env_file
            .clone()
            .unwrap_or_else(|| self.manager.credentials_file());
        let api_key = load_api_key(&env_file)?;
        let config = self.manager.settings().elevenlabs_config(api_key);
        Ok(ElevenLabs::new(config)?)
    }

    fn client(&self) -> Result<Arc<dyn TextToSpeech>> {
        let retry = self.manager.settings().retry;
        Ok(Arc::new(RetryingClient::new(self.elevenlabs()?, retry)))
    }

    pub async fn voices(&self, group: bool) -> Result<()> {
        let voices = self.client()?.list_voices().await?;
        info!(count = voices.len(), "Fetched voice catalog");

        if group {
            report::print_groups(&narrator_core::classify::categorize(&voices), self.json)
        } else {
            report::print_voices(&voices, self.json)
        }
    }

    pub async fn classify(
        &self,
        terms: Vec<String>,
        labels: Vec<(String, String)>,
        allowlist: Vec<String>,
    ) -> Result<()> {
        let classifier: Box<dyn VoiceClassifier> = if !allowlist.is_empty() {
            Box::new(AllowlistClassifier::new(allowlist))
        } else if !terms.is_empty() || !labels.is_empty() {
            let labels: BTreeMap<String, String> = labels.into_iter().collect();
            Box::new(HeuristicClassifier::new(terms, labels))
        } else {
            self.manager.settings().classifier.build()
        };

        let voices = self.client()?.list_voices().await?;
        let classification = classifier.classify(&voices);
        info!(
            matched = classification.matched.len(),
            unmatched = classification.unmatched.len(),
            "Classified voice catalog"
        );
        report::print_classification(&classification, self.json)
    }

    pub async fn account(&self) -> Result<()> {
        let account = self.elevenlabs()?.account().await?;
        report::print_account(&account, self.json)
    }

    pub fn scenes(&self) -> Result<()> {
        let catalog = self.manager.settings().catalog()?;
        report::print_scenes(catalog.scenes(), self.json)
    }

    pub async fn generate(&self, scene_ids: Vec<String>, output_dir: Option<PathBuf>) -> Result<()> {
        let catalog = self.manager.settings().catalog()?;
        let scenes = catalog.select(&scene_ids)?;
        let client = self.client()?;
        let output_dir = output_dir.unwrap_or_else(|| self.manager.output_dir());

        let summary = self
            .run_batch(client, &scenes, catalog.voices(), catalog.emotions(), &output_dir)
            .await?;
        report::print_summary(&summary, self.json)
    }

    pub async fn sample(
        &self,
        voice_names: Vec<String>,
        texts: Vec<String>,
        emotion: String,
        output_dir: Option<PathBuf>,
    ) -> Result<()> {
        let settings = self.manager.settings();
        let emotions = EmotionTable::new(settings.emotions.clone())?;
        emotions.resolve(&emotion)?;

        let client = self.client()?;
        let mut voices = settings.voice_table();
        if voice_names.iter().any(|name| voices.resolve(name).is_err()) {
            let catalog = client
                .list_voices()
                .await
                .context("Failed to fetch the voice catalog to resolve voice names")?;
            for name in fill_from_catalog(&mut voices, &voice_names, &catalog) {
                warn!(voice = %name, "Voice not found in settings or catalog");
            }
        }

        let texts = if texts.is_empty() {
            vec![DEFAULT_SAMPLE_TEXT.to_string()]
        } else {
            texts
        };
        let scenes = sample_scenes(&voice_names, &texts, &emotion);
        let output_dir = output_dir.unwrap_or_else(|| self.manager.output_dir().join("samples"));

        let summary = self
            .run_batch(client, &scenes, &voices, &emotions, &output_dir)
            .await?;
        report::print_summary(&summary, self.json)
    }

    /// Drive a batch with a progress bar on stderr. Ctrl-C cancels scenes
    /// that have not started; calls already in flight finish.
    async fn run_batch(
        &self,
        client: Arc<dyn TextToSpeech>,
        scenes: &[Scene],
        voices: &VoiceTable,
        emotions: &EmotionTable,
        output_dir: &Path,
    ) -> Result<RunSummary> {
        let settings = self.manager.settings();
        let (tx, mut events) = mpsc::unbounded_channel();
        let orchestrator = Orchestrator::new(client, settings.schedule)
            .with_output_format(settings.output_format)
            .with_events(tx);
        let cancel = orchestrator.cancel_handle();

        let bar = if self.json {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(scenes.len() as u64)
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("=> "),
        );

        let batch = orchestrator.run_batch(scenes, voices, emotions, output_dir);
        tokio::pin!(batch);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let summary = loop {
            tokio::select! {
                summary = &mut batch => break summary?,
                Some(event) = events.recv() => show_event(&bar, event),
                _ = &mut ctrl_c, if !cancel.is_cancelled() => {
                    warn!("Interrupted, cancelling scenes that have not started");
                    bar.println("Cancelling remaining scenes...");
                    cancel.cancel();
                }
            }
        };
        while let Ok(event) = events.try_recv() {
            show_event(&bar, event);
        }
        bar.finish_and_clear();

        Ok(summary)
    }
}

fn show_event(bar: &ProgressBar, event: BatchEvent) {
    match event {
        BatchEvent::SceneStarted { scene_id, .. } => bar.set_message(scene_id),
        BatchEvent::SceneFinished { result, .. } => {
            if !result.success() {
                bar.println(format!(
                    "✗ {}: {}",
                    result.scene_id(),
                    result.error_detail().unwrap_or_default()
                ));
            }
            bar.inc(1);
        }
    }
}
