//! Integration tests for summary engine failover behaviour.
//!
//! The chain holds two [`InferenceClient`]s bound to different model ids.
//! A failing primary must hand over to the fallback exactly once, the
//! answering model must be recorded, and terminal upstream errors must
//! stop the chain without touching the fallback.

use std::sync::Arc;

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use newsreel::Error;
use newsreel::providers::{InferenceClient, SummaryBounds, SummaryChain};

const BOUNDS: SummaryBounds = SummaryBounds {
    min_words: 30,
    max_words: 150,
};

fn chain_against(server: &MockServer) -> SummaryChain {
    let primary = InferenceClient::new(server.uri(), "test_key", "primary-model");
    let fallback = InferenceClient::new(server.uri(), "test_key", "fallback-model");
    SummaryChain::new(Arc::new(primary), Some(Arc::new(fallback)))
}

#[tokio::test]
async fn failing_primary_hands_over_to_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/primary-model"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model exploded"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/models/fallback-model"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "summary_text": "Short fallback summary." }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let result = chain_against(&server)
        .summarize("A long article body goes here.", BOUNDS)
        .await
        .expect("fallback tier should answer");

    assert_eq!(result.engine, "fallback-model");
    assert!(result.fell_back);
    assert_eq!(result.value, "Short fallback summary.");
}

#[tokio::test]
async fn both_tiers_failing_is_a_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("loading"))
        .mount(&server)
        .await;

    let result = chain_against(&server)
        .summarize("A long article body goes here.", BOUNDS)
        .await;

    assert!(matches!(result, Err(Error::EnginesExhausted(_))));
}

#[tokio::test]
async fn upstream_auth_rejection_skips_the_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/primary-model"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&server)
        .await;

    // The fallback shares credentials; it must not be consulted.
    Mock::given(method("POST"))
        .and(path("/models/fallback-model"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "summary_text": "should never be produced" }
        ])))
        .expect(0)
        .mount(&server)
        .await;

    let result = chain_against(&server)
        .summarize("A long article body goes here.", BOUNDS)
        .await;

    assert!(matches!(result, Err(Error::Api { status: 401, .. })));
}

#[tokio::test]
async fn generation_parameters_reach_the_upstream() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/primary-model"))
        .and(body_partial_json(serde_json::json!({
            "parameters": { "max_length": 150, "min_length": 30, "do_sample": false }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "summary_text": "Parameterized summary." }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let primary = InferenceClient::new(server.uri(), "test_key", "primary-model");
    let chain = SummaryChain::new(Arc::new(primary), None);
    let result = chain.summarize("body", BOUNDS).await.unwrap();
    assert_eq!(result.engine, "primary-model");
}

#[tokio::test]
async fn empty_candidate_list_triggers_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/primary-model"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/models/fallback-model"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "summary_text": "Recovered from empty output." }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let result = chain_against(&server)
        .summarize("A long article body goes here.", BOUNDS)
        .await
        .unwrap();
    assert_eq!(result.engine, "fallback-model");
}
