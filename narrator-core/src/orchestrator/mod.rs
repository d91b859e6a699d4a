//! Batch synthesis of scenes.
//!
//! Each scene moves `Pending -> InFlight -> {Succeeded, Failed}` exactly
//! once. A failing scene never stops the batch, and the summary is only
//! built after every scene has reached a terminal state.

mod schedule;
mod summary;

pub use schedule::SchedulePolicy;
pub use summary::{RunSummary, SynthesisResult};

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::{NarratorError, Result};
use crate::output::{file_stem, OutputWriter};
use crate::scenes::{EmotionTable, Scene, SceneCatalog, VoiceTable};
use crate::voice::provider::{validate_text, TextToSpeech};
use crate::voice::{OutputFormat, SynthesisParameters};
use schedule::{cancelled, is_cancelled, pause, Pacer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    Pending,
    InFlight,
    Succeeded,
    Failed,
}

impl SceneState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Progress notifications emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    SceneStarted { index: usize, scene_id: String },
    SceneFinished { index: usize, result: SynthesisResult },
}

/// Raises the cancellation signal of the orchestrator it came from. Scenes
/// that have not started yet finish as failed with
/// [`NarratorError::Cancelled`]; calls already in flight complete. Once
/// raised the signal stays raised.
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

pub struct Orchestrator {
    client: Arc<dyn TextToSpeech>,
    schedule: SchedulePolicy,
    output_format: OutputFormat,
    events: Option<mpsc::UnboundedSender<BatchEvent>>,
    cancel: Arc<watch::Sender<bool>>,
}

/// A scene resolved into everything a synthesis call needs.
struct Job {
    index: usize,
    scene_id: String,
    voice_id: String,
    text: String,
    params: SynthesisParameters,
}

struct Planned {
    index: usize,
    scene_id: String,
    job: Result<Job>,
}

/// Per-scene state plus the optional event channel, shared with workers.
struct Progress {
    states: Mutex<Vec<SceneState>>,
    events: Option<mpsc::UnboundedSender<BatchEvent>>,
}

impl Progress {
    fn new(len: usize, events: Option<mpsc::UnboundedSender<BatchEvent>>) -> Self {
        Self {
            states: Mutex::new(vec![SceneState::Pending; len]),
            events,
        }
    }

    fn started(&self, index: usize, scene_id: &str) {
        {
            let mut states = self.states.lock().unwrap();
            debug_assert_eq!(states[index], SceneState::Pending);
            states[index] = SceneState::InFlight;
        }
        self.emit(BatchEvent::SceneStarted {
            index,
            scene_id: scene_id.to_string(),
        });
    }

    fn finished(&self, index: usize, result: SynthesisResult) -> SynthesisResult {
        {
            let mut states = self.states.lock().unwrap();
            if states[index].is_terminal() {
                warn!(index, scene_id = result.scene_id(), "Scene already finished");
                return result;
            }
            states[index] = if result.success() {
                SceneState::Succeeded
            } else {
                SceneState::Failed
            };
        }
        self.emit(BatchEvent::SceneFinished {
            index,
            result: result.clone(),
        });
        result
    }

    fn all_terminal(&self) -> bool {
        self.states.lock().unwrap().iter().all(SceneState::is_terminal)
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = tx.send(event);
        }
    }
}

impl Orchestrator {
    pub fn new(client: Arc<dyn TextToSpeech>, schedule: SchedulePolicy) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            client,
            schedule,
            output_format: OutputFormat::default(),
            events: None,
            cancel: Arc::new(cancel),
        }
    }

    /// Must match the format the client requests, since it picks the file
    /// extension.
    pub fn with_output_format(mut self, output_format: OutputFormat) -> Self {
        self.output_format = output_format;
        self
    }

    pub fn with_events(mut self, events: mpsc::UnboundedSender<BatchEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.cancel),
        }
    }

    pub fn output_path(&self, output_dir: &Path, scene_id: &str) -> PathBuf {
        OutputWriter::new(output_dir, self.output_format).path_for(scene_id)
    }

    /// Run the selected scenes of a validated catalog.
    pub async fn run_catalog(
        &self,
        catalog: &SceneCatalog,
        scene_ids: &[String],
        output_dir: &Path,
    ) -> Result<RunSummary> {
        let scenes = catalog.select(scene_ids)?;
        self.run_batch(&scenes, catalog.voices(), catalog.emotions(), output_dir)
            .await
    }

    /// Drive `scenes` to completion. Voice and emotion references are
    /// resolved per scene: an unresolvable one fails that scene without a
    /// network call and the batch moves on. Errors are returned only for an
    /// invalid schedule or a failure to create `output_dir`, both before any
    /// call.
    pub async fn run_batch(
        &self,
        scenes: &[Scene],
        voices: &VoiceTable,
        emotions: &EmotionTable,
        output_dir: &Path,
    ) -> Result<RunSummary> {
        self.schedule.validate()?;
        let started_at = Utc::now();
        if scenes.is_empty() {
            return Ok(RunSummary::new(scenes, Vec::new(), started_at));
        }

        let writer = OutputWriter::new(output_dir, self.output_format);
        writer.ensure_dir().await?;

        info!(
            scenes = scenes.len(),
            schedule = ?self.schedule,
            output_dir = %output_dir.display(),
            "Starting batch"
        );

        let plans = plan(scenes, voices, emotions);
        let progress = Arc::new(Progress::new(scenes.len(), self.events.clone()));

        let results = match self.schedule {
            SchedulePolicy::Sequential { delay_ms } => {
                self.run_sequential(plans, &writer, &progress, Duration::from_millis(delay_ms))
                    .await
            }
            SchedulePolicy::Bounded {
                max_concurrency,
                min_interval_ms,
            } => {
                self.run_bounded(
                    plans,
                    &writer,
                    &progress,
                    max_concurrency,
                    Duration::from_millis(min_interval_ms),
                )
                .await
            }
        };

        debug_assert!(progress.all_terminal());
        let summary = RunSummary::new(scenes, results, started_at);
        info!(
            total = summary.total_scenes,
            succeeded = summary.succeeded,
            failed = summary.failed.len(),
            "Batch finished"
        );
        Ok(summary)
    }

    async fn run_sequential(
        &self,
        plans: Vec<Planned>,
        writer: &OutputWriter,
        progress: &Progress,
        delay: Duration,
    ) -> Vec<SynthesisResult> {
        let mut cancel = self.cancel.subscribe();
        let mut results = Vec::with_capacity(plans.len());
        let mut called = false;

        for planned in plans {
            let result = match planned.job {
                Err(error) => SynthesisResult::failed(&planned.scene_id, error),
                Ok(job) => {
                    let proceed = if called {
                        pause(delay, &mut cancel).await
                    } else {
                        !is_cancelled(&cancel)
                    };
                    if proceed {
                        called = true;
                        progress.started(job.index, &job.scene_id);
                        run_job(self.client.as_ref(), writer, &job).await
                    } else {
                        SynthesisResult::failed(&job.scene_id, NarratorError::Cancelled)
                    }
                }
            };
            results.push(progress.finished(planned.index, result));
        }

        results
    }

    async fn run_bounded(
        &self,
        plans: Vec<Planned>,
        writer: &OutputWriter,
        progress: &Arc<Progress>,
        max_concurrency: usize,
        min_interval: Duration,
    ) -> Vec<SynthesisResult> {
        let semaphore = Arc::new(Semaphore::new(max_concurrency));
        let pacer = Arc::new(Pacer::new(min_interval));
        let mut slots: Vec<Option<SynthesisResult>> = vec![None; plans.len()];
        let mut scene_ids = Vec::with_capacity(plans.len());
        let mut workers = JoinSet::new();

        for planned in plans {
            scene_ids.push(planned.scene_id.clone());
            let job = match planned.job {
                Ok(job) => job,
                Err(error) => {
                    let result = SynthesisResult::failed(&planned.scene_id, error);
                    slots[planned.index] = Some(progress.finished(planned.index, result));
                    continue;
                }
            };

            let client = Arc::clone(&self.client);
            let writer = writer.clone();
            let progress = Arc::clone(progress);
            let semaphore = Arc::clone(&semaphore);
            let pacer = Arc::clone(&pacer);
            let mut cancel = self.cancel.subscribe();

            workers.spawn(async move {
                let index = job.index;
                let cancelled_result =
                    || SynthesisResult::failed(&job.scene_id, NarratorError::Cancelled);

                let _permit = tokio::select! {
                    biased;
                    _ = cancelled(&mut cancel) => return (index, cancelled_result()),
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return (index, cancelled_result()),
                    },
                };
                if is_cancelled(&cancel) {
                    return (index, cancelled_result());
                }
                tokio::select! {
                    biased;
                    _ = cancelled(&mut cancel) => return (index, cancelled_result()),
                    _ = pacer.wait() => {}
                }

                progress.started(index, &job.scene_id);
                (index, run_job(client.as_ref(), &writer, &job).await)
            });
        }

        // Barrier: every worker is joined before any aggregation happens.
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(progress.finished(index, result)),
                Err(e) => warn!(error = %e, "Synthesis worker did not complete"),
            }
        }

        slots
            .into_iter()
            .zip(scene_ids)
            .enumerate()
            .map(|(index, (slot, scene_id))| {
                slot.unwrap_or_else(|| {
                    let result = SynthesisResult::failed(
                        scene_id,
                        NarratorError::Io("synthesis worker aborted".to_string()),
                    );
                    progress.finished(index, result)
                })
            })
            .collect()
    }
}

/// Resolve every scene up front. Failures stay attached to their scene so
/// the batch can record them without touching the network.
fn plan(scenes: &[Scene], voices: &VoiceTable, emotions: &EmotionTable) -> Vec<Planned> {
    let mut claimed_stems = HashSet::new();

    scenes
        .iter()
        .enumerate()
        .map(|(index, scene)| {
            let job = resolve(index, scene, voices, emotions).and_then(|job| {
                if claimed_stems.insert(file_stem(&scene.id)) {
                    Ok(job)
                } else {
                    Err(NarratorError::Validation(format!(
                        "scene '{}' would overwrite the output of an earlier scene",
                        scene.id
                    )))
                }
            });
            Planned {
                index,
                scene_id: scene.id.clone(),
                job,
            }
        })
        .collect()
}

fn resolve(
    index: usize,
    scene: &Scene,
    voices: &VoiceTable,
    emotions: &EmotionTable,
) -> Result<Job> {
    validate_text(&scene.text)?;
    let voice_id = voices.resolve(&scene.voice_name)?.to_string();
    let params = emotions.resolve(&scene.emotion)?;
    Ok(Job {
        index,
        scene_id: scene.id.clone(),
        voice_id,
        text: scene.text.clone(),
        params,
    })
}

async fn run_job(client: &dyn TextToSpeech, writer: &OutputWriter, job: &Job) -> SynthesisResult {
    info!(
        scene_id = %job.scene_id,
        voice_id = %job.voice_id,
        "Synthesizing scene"
    );

    match synthesize_to_file(client, writer, job).await {
        Ok(path) => {
            info!(scene_id = %job.scene_id, path = %path.display(), "Scene saved");
            SynthesisResult::succeeded(&job.scene_id, path)
        }
        Err(error) => {
            warn!(scene_id = %job.scene_id, error = %error, "Scene failed");
            SynthesisResult::failed(&job.scene_id, error)
        }
    }
}

async fn synthesize_to_file(
    client: &dyn TextToSpeech,
    writer: &OutputWriter,
    job: &Job,
) -> Result<PathBuf> {
    let audio = client
        .synthesize(&job.voice_id, &job.text, &job.params)
        .await?;
    if audio.is_empty() {
        return Err(NarratorError::EmptyAudio);
    }
    writer.write_atomic(&job.scene_id, &audio).await
}
