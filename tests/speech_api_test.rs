//! HTTP surface tests for the speech-synthesis service.
//!
//! The synthesis engine is stubbed; ffprobe is replaced by a fake that
//! reports fixed metadata, so the artifact-metadata path runs without
//! media binaries installed.

mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};

use newsreel::config::SpeechConfig;
use newsreel::media::MediaToolkit;
use newsreel::providers::SpeechChain;
use newsreel::server::speech::{SpeechState, router};
use support::CountingSpeechEngine;

const SECRET: &str = "test-secret";

struct TestService {
    base: String,
    calls: Arc<AtomicUsize>,
}

async fn spawn_service(fail_marker: Option<&'static str>) -> TestService {
    let tmp = tempfile::tempdir().unwrap();
    let config = SpeechConfig {
        cache_dir: tmp.path().join("cache"),
        output_dir: tmp.path().join("out"),
        secret: SECRET.to_string(),
        enable_postprocessing: false,
        ..SpeechConfig::default()
    };

    let calls = Arc::new(AtomicUsize::new(0));
    let engine = Arc::new(CountingSpeechEngine {
        calls: calls.clone(),
        fail_marker,
    });
    let chain = SpeechChain::new(engine, None);

    let probe = support::fake_probe_bin(tmp.path(), 2.5, 4410);
    let toolkit = MediaToolkit::new("ffmpeg", probe.display().to_string());

    let state = SpeechState::new(config, chain, toolkit).unwrap();
    state.set_ready(true);
    let base = support::spawn(router(state)).await;
    std::mem::forget(tmp);
    TestService { base, calls }
}

#[tokio::test]
async fn voices_catalog_is_open() {
    let service = spawn_service(None).await;
    let voices: Vec<Value> = reqwest::get(format!("{}/voices", service.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(voices.iter().any(|v| v["voice_id"] == "default"));
}

#[tokio::test]
async fn tts_requires_the_secret() {
    let service = spawn_service(None).await;
    let response = reqwest::Client::new()
        .post(format!("{}/tts", service.base))
        .json(&json!({ "text": "hello there" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn speed_bounds_are_enforced() {
    let service = spawn_service(None).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/tts", service.base))
        .bearer_auth(SECRET)
        .json(&json!({ "text": "hello there", "speed": 0.49 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["field"], "speed");
}

#[tokio::test]
async fn synthesis_roundtrip_and_cache_hit() {
    let service = spawn_service(None).await;
    let client = reqwest::Client::new();
    let payload = json!({ "text": "Breaking news from the test suite." });

    let first: Value = client
        .post(format!("{}/tts", service.base))
        .bearer_auth(SECRET)
        .json(&payload)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(first["metadata"]["cached"], false);
    assert_eq!(first["voice_used"], "default");
    assert_eq!(first["duration"], 2.5);
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    let audio_url = first["audio_url"].as_str().unwrap().to_string();
    assert!(audio_url.starts_with("/audio/"));

    // The artifact is servable by name.
    let audio = client
        .get(format!("{}{audio_url}", service.base))
        .send()
        .await
        .unwrap();
    assert_eq!(audio.status(), 200);
    assert_eq!(audio.headers()["content-type"], "audio/wav");

    // Identical request: cache hit, engine untouched.
    let second: Value = client
        .post(format!("{}/tts", service.base))
        .bearer_auth(SECRET)
        .json(&payload)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["metadata"]["cached"], true);
    assert_eq!(second["duration"], first["duration"]);
    assert_eq!(second["file_size"], first["file_size"]);
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn different_voice_misses_the_cache() {
    let service = spawn_service(None).await;
    let client = reqwest::Client::new();

    for voice in ["default", "male"] {
        let response: Value = client
            .post(format!("{}/tts", service.base))
            .bearer_auth(SECRET)
            .json(&json!({ "text": "Same text either way.", "voice_id": voice }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(response["metadata"]["cached"], false);
    }
    assert_eq!(service.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn batch_aborts_on_first_failure() {
    let service = spawn_service(Some("POISON")).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/tts/batch", service.base))
        .bearer_auth(SECRET)
        .json(&json!({
            "texts": ["A fine sentence.", "POISON pill here.", "Never reached? Still computed."]
        }))
        .send()
        .await
        .unwrap();

    // One failing item aborts the whole batch. Kept semantics.
    assert_eq!(response.status(), 500);
}

#[tokio::test]
async fn batch_cap_is_enforced() {
    let service = spawn_service(None).await;
    let texts: Vec<String> = (0..6).map(|i| format!("text number {i}")).collect();
    let response = reqwest::Client::new()
        .post(format!("{}/tts/batch", service.base))
        .bearer_auth(SECRET)
        .json(&json!({ "texts": texts }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn missing_artifact_is_404_and_traversal_is_rejected() {
    let service = spawn_service(None).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/audio/deadbeef.wav", service.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = client
        .get(format!("{}/audio/..%2F..%2Fetc%2Fpasswd", service.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}
