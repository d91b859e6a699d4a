use std::time::{Duration, Instant};

use narrator_core::{
    orchestrator::BatchEvent,
    scenes::{builtin::default_emotions, SceneCatalog},
    voice::mock::{MockBehavior, MockClient},
    voice::RetryPolicy,
    NarratorError, RetryingClient, SchedulePolicy, TextToSpeech,
};
use tokio::sync::mpsc;


use fixture::{scene, Fixture};

#[test]
fn test_unknown_voice_fails_only_that_scene() {
    fixture::run(|fixture| async move {
        let scenes = vec![
            scene("a", "Alpha", "intense"),
            scene("b", "Nobody", "intense"),
            scene("c", "Beta", "cinematic"),
        ];

        let summary = fixture.run(&scenes).await;

        assert_eq!(summary.total_scenes, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, vec!["b"]);
        assert_eq!(
            summary.result("b").unwrap().error(),
            Some(&NarratorError::not_found("voice", "Nobody"))
        );
        // The unresolvable scene never reaches the service.
        assert_eq!(fixture.mock.get_call_count(), 2);
        assert_eq!(fixture.written_files(), vec!["a.mp3", "c.mp3"]);
    });
}

#[test]
fn test_unknown_emotion_fails_only_that_scene() {
    fixture::run(|fixture| async move {
        let scenes = vec![
            scene("a", "Alpha", "melancholy"),
            scene("b", "Beta", "suspense"),
        ];

        let summary = fixture.run(&scenes).await;

        assert_eq!(summary.failed, vec!["a"]);
        assert!(matches!(
            summary.result("a").unwrap().error(),
            Some(NarratorError::NotFound {
                kind: "emotion",
                ..
            })
        ));
        assert_eq!(fixture.mock.get_call_count(), 1);
    });
}

#[test]
fn test_empty_batch_makes_no_calls() {
    fixture::run(|fixture| async move {
        let output_dir = fixture.output_dir().join("never-created");

        let summary = fixture
            .orchestrator(fixture::immediate())
            .run_batch(&[], &fixture.voices, &fixture.emotions, &output_dir)
            .await
            .unwrap();

        assert_eq!(summary.total_scenes, 0);
        assert_eq!(summary.succeeded, 0);
        assert!(summary.failed.is_empty());
        assert_eq!(fixture.mock.get_call_count(), 0);
        assert!(!output_dir.exists());
    });
}

#[test]
fn test_zero_concurrency_is_rejected_before_any_call() {
    fixture::run(|fixture| async move {
        let output_dir = fixture.output_dir().join("never-created");
        let scenes = vec![scene("intro", "Alpha", "cinematic")];

        let result = fixture
            .orchestrator(SchedulePolicy::bounded(0, Duration::ZERO))
            .run_batch(&scenes, &fixture.voices, &fixture.emotions, &output_dir)
            .await;

        assert!(matches!(result, Err(NarratorError::Validation(_))));
        assert_eq!(fixture.mock.get_call_count(), 0);
        assert!(!output_dir.exists());
    });
}

#[test]
fn test_service_failure_writes_no_file() {
    fixture::run_with_behavior(
        MockBehavior::FailVoices {
            voice_ids: vec!["voice-b".to_string()],
            status: 422,
        },
        |fixture| async move {
            let scenes = vec![
                scene("a", "Alpha", "intense"),
                scene("b", "Beta", "intense"),
                scene("c", "Gamma", "intense"),
            ];

            let summary = fixture.run(&scenes).await;

            assert_eq!(summary.succeeded, 2);
            assert_eq!(summary.failed, vec!["b"]);
            let failed = summary.result("b").unwrap();
            assert!(failed.output_path().is_none());
            assert!(matches!(
                failed.error(),
                Some(NarratorError::Service { status: 422, .. })
            ));
            assert_eq!(fixture.mock.get_call_count(), 3);
            assert_eq!(fixture.written_files(), vec!["a.mp3", "c.mp3"]);
        },
    );
}

#[test]
fn test_network_failures_do_not_stop_the_batch() {
    fixture::run_with_behavior(MockBehavior::AlwaysNetworkError, |fixture| async move {
        let scenes = vec![
            scene("a", "Alpha", "intense"),
            scene("b", "Beta", "suspense"),
            scene("c", "Gamma", "cinematic"),
        ];

        let summary = fixture.run(&scenes).await;

        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, vec!["a", "b", "c"]);
        assert_eq!(fixture.mock.get_call_count(), 3);
        assert!(fixture.written_files().is_empty());
    });
}

#[test]
fn test_empty_audio_is_a_failure() {
    fixture::run_with_behavior(MockBehavior::EmptyAudio, |fixture| async move {
        let summary = fixture.run(&[scene("a", "Alpha", "intense")]).await;

        assert_eq!(
            summary.result("a").unwrap().error(),
            Some(&NarratorError::EmptyAudio)
        );
        assert!(fixture.written_files().is_empty());
    });
}

#[test]
fn test_distributions_cover_every_scene() {
    fixture::run_with_behavior(
        MockBehavior::FailVoices {
            voice_ids: vec!["voice-c".to_string()],
            status: 500,
        },
        |fixture| async move {
            let scenes = vec![
                scene("a", "Alpha", "intense"),
                scene("b", "Alpha", "suspense"),
                scene("c", "Gamma", "intense"),
                scene("d", "Beta", "cinematic"),
            ];

            let summary = fixture.run(&scenes).await;

            assert_eq!(summary.succeeded + summary.failed.len(), 4);
            assert_eq!(summary.voice_distribution.values().sum::<usize>(), 4);
            assert_eq!(summary.emotion_distribution.values().sum::<usize>(), 4);
            assert_eq!(summary.voice_distribution["Alpha"], 2);
            assert_eq!(summary.emotion_distribution["intense"], 2);
            assert!(summary.started_at <= summary.finished_at);
        },
    );
}

#[test]
fn test_duplicate_output_names_fail_the_later_scene() {
    fixture::run(|fixture| async move {
        let scenes = vec![
            scene("Opening Shot", "Alpha", "intense"),
            scene("opening-shot", "Beta", "intense"),
        ];

        let summary = fixture.run(&scenes).await;

        assert_eq!(summary.failed, vec!["opening-shot"]);
        assert!(matches!(
            summary.result("opening-shot").unwrap().error(),
            Some(NarratorError::Validation(_))
        ));
        assert_eq!(fixture.mock.get_call_count(), 1);
        assert_eq!(fixture.written_files(), vec!["opening-shot.mp3"]);
    });
}

#[test]
fn test_requests_carry_resolved_voice_and_emotion() {
    fixture::run(|fixture| async move {
        fixture.run(&[scene("a", "Beta", "suspense")]).await;

        let requests = fixture.mock.get_captured_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].voice_id, "voice-b");
        assert_eq!(requests[0].text, "Narration for a.");
        assert_eq!(
            requests[0].params,
            default_emotions()["suspense"].params
        );
    });
}

#[test]
fn test_audio_bytes_written_verbatim() {
    let mock = MockClient::new(MockBehavior::Success).with_audio(vec![1, 2, 3, 4]);
    let fixture = Fixture::with_client(mock);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(async {
        let summary = fixture.run(&[scene("a", "Alpha", "intense")]).await;
        let path = summary.result("a").unwrap().output_path().unwrap();
        assert_eq!(std::fs::read(path).unwrap(), vec![1, 2, 3, 4]);
    });
}

#[test]
fn test_sequential_delay_between_calls() {
    fixture::run(|fixture| async move {
        let scenes = vec![
            scene("a", "Alpha", "intense"),
            scene("b", "Beta", "intense"),
            scene("c", "Gamma", "intense"),
        ];
        let started = Instant::now();

        let summary = fixture
            .orchestrator(SchedulePolicy::sequential(Duration::from_millis(40)))
            .run_batch(&scenes, &fixture.voices, &fixture.emotions, fixture.output_dir())
            .await
            .unwrap();

        assert!(summary.all_succeeded());
        assert!(started.elapsed() >= Duration::from_millis(80));
    });
}

#[test]
fn test_bounded_schedule_respects_concurrency_limit() {
    let mock = MockClient::new(MockBehavior::Success).with_latency(Duration::from_millis(30));
    let fixture = Fixture::with_client(mock);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(async {
        let scenes: Vec<_> = (0..8)
            .map(|i| scene(&format!("scene-{i}"), "Alpha", "cinematic"))
            .collect();

        let summary = fixture
            .orchestrator(SchedulePolicy::bounded(2, Duration::ZERO))
            .run_batch(&scenes, &fixture.voices, &fixture.emotions, fixture.output_dir())
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 8);
        assert!(fixture.mock.peak_concurrency() <= 2);
        assert!(fixture.mock.peak_concurrency() >= 1);
        let order: Vec<&str> = summary.results.iter().map(|r| r.scene_id()).collect();
        let expected: Vec<String> = (0..8).map(|i| format!("scene-{i}")).collect();
        assert_eq!(order, expected);
    });
}

#[test]
fn test_every_scene_reports_exactly_once() {
    fixture::run_with_behavior(
        MockBehavior::FailVoices {
            voice_ids: vec!["voice-b".to_string()],
            status: 500,
        },
        |fixture| async move {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let scenes = vec![
                scene("a", "Alpha", "intense"),
                scene("b", "Beta", "intense"),
                scene("c", "Nobody", "intense"),
            ];

            fixture
                .orchestrator(SchedulePolicy::bounded(2, Duration::ZERO))
                .with_events(tx)
                .run_batch(&scenes, &fixture.voices, &fixture.emotions, fixture.output_dir())
                .await
                .unwrap();

            let mut started = Vec::new();
            let mut finished = Vec::new();
            while let Ok(event) = rx.try_recv() {
                match event {
                    BatchEvent::SceneStarted { scene_id, .. } => started.push(scene_id),
                    BatchEvent::SceneFinished { index, .. } => finished.push(index),
                }
            }
            started.sort();
            finished.sort();

            // The unresolvable scene finishes without ever starting.
            assert_eq!(started, vec!["a", "b"]);
            assert_eq!(finished, vec![0, 1, 2]);
        },
    );
}

#[test]
fn test_run_catalog_selects_requested_scenes() {
    fixture::run(|fixture| async move {
        let catalog = SceneCatalog::new(
            fixture.voices.clone(),
            fixture.emotions.clone(),
            vec![
                scene("a", "Alpha", "intense"),
                scene("b", "Beta", "intense"),
                scene("c", "Gamma", "intense"),
            ],
        )
        .unwrap();

        let summary = fixture
            .orchestrator(fixture::immediate())
            .run_catalog(
                &catalog,
                &["c".to_string(), "a".to_string()],
                fixture.output_dir(),
            )
            .await
            .unwrap();

        let order: Vec<&str> = summary.results.iter().map(|r| r.scene_id()).collect();
        assert_eq!(order, vec!["c", "a"]);
        assert_eq!(fixture.written_files(), vec!["a.mp3", "c.mp3"]);

        let missing = fixture
            .orchestrator(fixture::immediate())
            .run_catalog(&catalog, &["zzz".to_string()], fixture.output_dir())
            .await;
        assert_eq!(missing.unwrap_err(), NarratorError::not_found("scene", "zzz"));
    });
}

#[test]
fn test_retrying_client_recovers_transient_failures() {
    fixture::run_with_behavior(
        MockBehavior::ServiceErrorThenSuccess {
            remaining_errors: 1,
            status: 503,
        },
        |fixture| async move {
            let policy = RetryPolicy {
                max_attempts: 3,
                initial_backoff_ms: 1,
                max_backoff_ms: 5,
                multiplier: 2.0,
            };
            let client = RetryingClient::new(fixture.mock.clone(), policy);
            assert_eq!(client.name(), "mock");

            let summary = narrator_core::Orchestrator::new(
                std::sync::Arc::new(client),
                fixture::immediate(),
            )
            .run_batch(
                &[scene("a", "Alpha", "intense")],
                &fixture.voices,
                &fixture.emotions,
                fixture.output_dir(),
            )
            .await
            .unwrap();

            assert!(summary.all_succeeded());
            assert_eq!(fixture.mock.get_call_count(), 2);
        },
    );
}
