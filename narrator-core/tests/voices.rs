use std::collections::BTreeMap;

use narrator_core::{
    classify::{categorize, AllowlistClassifier, HeuristicClassifier},
    sample::{fill_from_catalog, sample_scenes},
    voice::mock::{MockBehavior, MockClient},
    NarratorError, TextToSpeech, Voice, VoiceClassifier,
};


use fixture::Fixture;

fn remote_catalog() -> Vec<Voice> {
    vec![
        Voice::new("id-callum", "Callum")
            .with_description("Hoarse, intense")
            .with_label("gender", "male")
            .with_label("age", "middle aged"),
        Voice::new("id-aria", "Aria")
            .with_description("Expressive, warm")
            .with_label("gender", "female")
            .with_label("age", "young"),
        Voice::new("id-river", "River")
            .with_description("Confident, relaxed")
            .with_label("gender", "non-binary"),
        Voice::new("id-george", "George")
            .with_description("Warm storyteller")
            .with_label("gender", "male")
            .with_label("age", "middle aged"),
    ]
}

#[tokio::test]
async fn test_classify_fetched_catalog() {
    let client = MockClient::new(MockBehavior::Success).with_voices(remote_catalog());
    let voices = client.list_voices().await.unwrap();

    let classifier = HeuristicClassifier::new(["storyteller"], BTreeMap::new())
        .with_label("gender", "non-binary");
    let classification = classifier.classify(&voices);

    let matched: Vec<&str> = classification.matched.iter().map(|v| v.name.as_str()).collect();
    let unmatched: Vec<&str> = classification
        .unmatched
        .iter()
        .map(|v| v.name.as_str())
        .collect();
    assert_eq!(matched, vec!["River", "George"]);
    assert_eq!(unmatched, vec!["Callum", "Aria"]);
    assert_eq!(classification.len(), voices.len());

    let allowlist = AllowlistClassifier::new(["id-aria"]);
    let authoritative = allowlist.classify(&voices);
    assert_eq!(authoritative.matched.len(), 1);
    assert_eq!(authoritative.matched[0].name, "Aria");
}

#[tokio::test]
async fn test_catalog_fetch_failure_is_reported() {
    let client = MockClient::new(MockBehavior::AlwaysServiceError { status: 401 });
    let result = client.list_voices().await;
    assert!(matches!(
        result,
        Err(NarratorError::Service { status: 401, .. })
    ));
    assert_eq!(client.get_list_count(), 1);
}

#[test]
fn test_categorize_groups_by_labels() {
    let groups = categorize(&remote_catalog());
    let names: Vec<(&str, usize)> = groups
        .iter()
        .map(|g| (g.category.as_str(), g.voices.len()))
        .collect();
    assert_eq!(names[0], ("male - middle aged", 2));
    assert_eq!(groups.iter().map(|g| g.voices.len()).sum::<usize>(), 4);
}

#[test]
fn test_sampling_voices_resolved_from_catalog() {
    fixture::run(|fixture| async move {
        let mut voices = fixture.voices.clone();
        let names = vec!["Callum".to_string(), "george".to_string()];
        let missing = fill_from_catalog(&mut voices, &names, &remote_catalog());
        assert!(missing.is_empty());

        let scenes = sample_scenes(
            &names,
            &["Fear is the mind-killer.".to_string()],
            "suspense",
        );
        let summary = fixture
            .orchestrator(fixture::immediate())
            .run_batch(&scenes, &voices, &fixture.emotions, fixture.output_dir())
            .await
            .unwrap();

        assert!(summary.all_succeeded());
        assert_eq!(
            fixture.written_files(),
            vec!["callum-sample-1.mp3", "george-sample-1.mp3"]
        );
        let voice_ids: Vec<String> = fixture
            .mock
            .get_captured_requests()
            .into_iter()
            .map(|r| r.voice_id)
            .collect();
        assert_eq!(voice_ids, vec!["id-callum", "id-george"]);
    });
}

#[test]
fn test_sampling_unknown_voice_fails_that_sample_only() {
    let fixture = Fixture::new();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(async {
        let scenes = sample_scenes(
            &["Alpha".to_string(), "Ghost".to_string()],
            &["One".to_string(), "Two".to_string()],
            "cinematic",
        );
        let summary = fixture
            .orchestrator(fixture::immediate())
            .run_batch(&scenes, &fixture.voices, &fixture.emotions, fixture.output_dir())
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, vec!["ghost-sample-1", "ghost-sample-2"]);
        assert_eq!(fixture.mock.get_call_count(), 2);
    });
}
