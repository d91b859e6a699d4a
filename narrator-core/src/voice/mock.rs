use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::provider::{validate_text, TextToSpeech};
use super::types::{SynthesisParameters, Voice};
use crate::error::{NarratorError, Result};

/// Mock behavior for the mock client
#[derive(Debug, Clone, Default)]
pub enum MockBehavior {
    /// Return `audio` for every synthesis call
    #[default]
    Success,
    /// Fail with a service error whenever the voice id is listed
    FailVoices { voice_ids: Vec<String>, status: u16 },
    /// Fail with a network error whenever the voice id is listed
    NetworkErrorForVoices { voice_ids: Vec<String> },
    /// Return a service error N times, then succeed
    ServiceErrorThenSuccess { remaining_errors: usize, status: u16 },
    /// Always return a service error
    AlwaysServiceError { status: u16 },
    /// Always return a network error
    AlwaysNetworkError,
    /// Answer with a success status but no bytes
    EmptyAudio,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRequest {
    pub voice_id: String,
    pub text: String,
    pub params: SynthesisParameters,
}

#[derive(Default)]
struct Concurrency {
    in_flight: usize,
    peak: usize,
}

/// In-memory stand-in for a remote text-to-speech service.
#[derive(Clone)]
pub struct MockClient {
    behavior: Arc<Mutex<MockBehavior>>,
    voices: Arc<Mutex<Vec<Voice>>>,
    audio: Vec<u8>,
    latency: Duration,
    call_count: Arc<Mutex<usize>>,
    list_count: Arc<Mutex<usize>>,
    captured_requests: Arc<Mutex<Vec<CapturedRequest>>>,
    concurrency: Arc<Mutex<Concurrency>>,
}

impl MockClient {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            voices: Arc::new(Mutex::new(Vec::new())),
            audio: b"ID3mock-audio".to_vec(),
            latency: Duration::ZERO,
            call_count: Arc::new(Mutex::new(0)),
            list_count: Arc::new(Mutex::new(0)),
            captured_requests: Arc::new(Mutex::new(Vec::new())),
            concurrency: Arc::new(Mutex::new(Concurrency::default())),
        }
    }

    pub fn with_voices(self, voices: Vec<Voice>) -> Self {
        *self.voices.lock().unwrap() = voices;
        self
    }

    /// Every synthesis call sleeps this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_audio(mut self, audio: Vec<u8>) -> Self {
        self.audio = audio;
        self
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Number of synthesis calls made, failed ones included.
    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_list_count(&self) -> usize {
        *self.list_count.lock().unwrap()
    }

    pub fn get_captured_requests(&self) -> Vec<CapturedRequest> {
        self.captured_requests.lock().unwrap().clone()
    }

    /// Highest number of synthesis calls observed in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.concurrency.lock().unwrap().peak
    }

    fn enter(&self) {
        let mut c = self.concurrency.lock().unwrap();
        c.in_flight += 1;
        c.peak = c.peak.max(c.in_flight);
    }

    fn exit(&self) {
        self.concurrency.lock().unwrap().in_flight -= 1;
    }

    fn respond(&self, voice_id: &str) -> Result<Vec<u8>> {
        let mut behavior = self.behavior.lock().unwrap();
        match &mut *behavior {
            MockBehavior::Success => Ok(self.audio.clone()),
            MockBehavior::FailVoices { voice_ids, status } => {
                if voice_ids.iter().any(|v| v == voice_id) {
                    Err(NarratorError::Service {
                        status: *status,
                        body: format!("mock failure for voice {voice_id}"),
                    })
                } else {
                    Ok(self.audio.clone())
                }
            }
            MockBehavior::NetworkErrorForVoices { voice_ids } => {
                if voice_ids.iter().any(|v| v == voice_id) {
                    Err(NarratorError::Network("mock connection reset".to_string()))
                } else {
                    Ok(self.audio.clone())
                }
            }
            MockBehavior::ServiceErrorThenSuccess {
                remaining_errors,
                status,
            } => {
                if *remaining_errors > 0 {
                    *remaining_errors -= 1;
                    Err(NarratorError::Service {
                        status: *status,
                        body: format!("mock error (remaining: {remaining_errors})"),
                    })
                } else {
                    Ok(self.audio.clone())
                }
            }
            MockBehavior::AlwaysServiceError { status } => Err(NarratorError::Service {
                status: *status,
                body: "mock service error".to_string(),
            }),
            MockBehavior::AlwaysNetworkError => {
                Err(NarratorError::Network("mock network error".to_string()))
            }
            MockBehavior::EmptyAudio => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl TextToSpeech for MockClient {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        *self.list_count.lock().unwrap() += 1;
        match &*self.behavior.lock().unwrap() {
            MockBehavior::AlwaysNetworkError => {
                return Err(NarratorError::Network("mock network error".to_string()))
            }
            MockBehavior::AlwaysServiceError { status } => {
                return Err(NarratorError::Service {
                    status: *status,
                    body: "mock service error".to_string(),
                })
            }
            _ => {}
        }
        Ok(self.voices.lock().unwrap().clone())
    }

    async fn synthesize(
        &self,
        voice_id: &str,
        text: &str,
        params: &SynthesisParameters,
    ) -> Result<Vec<u8>> {
        validate_text(text)?;

        *self.call_count.lock().unwrap() += 1;
        self.captured_requests
            .lock()
            .unwrap()
            .push(CapturedRequest {
                voice_id: voice_id.to_string(),
                text: text.to_string(),
                params: *params,
            });

        self.enter();
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let result = self.respond(voice_id);
        self.exit();
        result
    }
}
