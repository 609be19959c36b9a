//! Hosted inference API client for abstractive summarization.
//!
//! Speaks the serverless summarization-pipeline endpoint shape:
//! `POST {base}/models/{model}` with `{"inputs": ..., "parameters": ...}`
//! returning `[{"summary_text": ...}]`. One client instance is bound to one
//! model id, so the primary and fallback tiers are simply two instances
//! with different models.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

use super::traits::{SummaryBounds, SummaryEngine};

/// Upstream request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for a hosted summarization model.
#[derive(Clone)]
pub struct InferenceClient {
    model: String,
    api_key: String,
    http: Client,
    base_url: String,
}

impl InferenceClient {
    /// Create a client bound to `model` at `base_url`.
    ///
    /// An empty `api_key` sends no Authorization header (anonymous tier).
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            model: model.into(),
            api_key: api_key.into(),
            http,
            base_url: base_url.into(),
        }
    }
}

#[derive(Serialize)]
struct SummarizeRequest<'a> {
    inputs: &'a str,
    parameters: SummarizeParameters,
}

#[derive(Serialize)]
struct SummarizeParameters {
    max_length: u32,
    min_length: u32,
    do_sample: bool,
}

#[derive(Deserialize)]
struct SummaryCandidate {
    summary_text: String,
}

#[async_trait]
impl SummaryEngine for InferenceClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn summarize(&self, text: &str, bounds: SummaryBounds) -> Result<String> {
        let url = format!("{}/models/{}", self.base_url, self.model);

        let mut request = self.http.post(&url).json(&SummarizeRequest {
            inputs: text,
            parameters: SummarizeParameters {
                max_length: bounds.max_words,
                min_length: bounds.min_words,
                do_sample: false,
            },
        });
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api { status, message });
        }

        let candidates: Vec<SummaryCandidate> = response
            .json()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let summary = candidates
            .into_iter()
            .next()
            .map(|c| c.summary_text)
            .ok_or(Error::EmptyOutput)?;

        if summary.trim().is_empty() {
            return Err(Error::EmptyOutput);
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_name_is_the_model_id() {
        let client = InferenceClient::new("http://localhost", "", "facebook/bart-large-cnn");
        assert_eq!(client.name(), "facebook/bart-large-cnn");
    }
}
