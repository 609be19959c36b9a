//! Summarization service: routes, validation, and orchestration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use axum::{
    Json, Router, extract::State, middleware,
    routing::{get, post},
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::cache::{ArtifactCache, CacheKey};
use crate::config::SummarizerConfig;
use crate::providers::{SummaryBounds, SummaryChain};
use crate::telemetry;
use crate::text::{self, key_points, quality_score};
use crate::{Error, Result};

use super::auth;
use super::error::ApiError;

/// Number of key points extracted per summary.
const KEY_POINT_COUNT: usize = 3;

/// Maximum articles per batch request.
const MAX_BATCH_ARTICLES: usize = 10;

/// Shared state for the summarization service.
#[derive(Clone)]
pub struct SummarizerState {
    config: Arc<SummarizerConfig>,
    chain: Arc<SummaryChain>,
    cache: Arc<ArtifactCache>,
    started: Instant,
    ready: Arc<AtomicBool>,
}

impl SummarizerState {
    /// Build service state; opens the cache directory.
    pub fn new(config: SummarizerConfig, chain: SummaryChain) -> Result<Self> {
        let cache = ArtifactCache::open(&config.cache_dir)?;
        Ok(Self {
            config: Arc::new(config),
            chain: Arc::new(chain),
            cache: Arc::new(cache),
            started: Instant::now(),
            ready: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Mark the service (not) ready; mutating endpoints answer 503 until
    /// ready.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

/// Build the summarization service router.
pub fn router(state: SummarizerState) -> Router {
    let secret = Arc::new(state.config.secret.clone());
    let gated = Router::new()
        .route("/summarize", post(summarize))
        .route("/summarize/batch", post(summarize_batch))
        .route_layer(middleware::from_fn_with_state(
            secret,
            auth::require_bearer,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_snapshot))
        .merge(gated)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

// ============================================================================
// Request/response types
// ============================================================================

/// One summarization request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeRequest {
    /// Article title.
    pub title: String,
    /// Article content.
    pub content: String,
    /// Desired summary length in words.
    #[serde(default = "default_length_hint")]
    pub length_hint: u32,
    /// ISO 639-1 language code.
    #[serde(default = "default_language")]
    pub language: String,
    /// Summary style: news, casual, formal.
    #[serde(default = "default_style")]
    pub style: String,
}

fn default_length_hint() -> u32 {
    120
}

fn default_language() -> String {
    "en".to_string()
}

fn default_style() -> String {
    "news".to_string()
}

/// Batch of summarization requests.
#[derive(Debug, Deserialize)]
pub struct BatchSummarizeRequest {
    pub articles: Vec<SummarizeRequest>,
}

/// One summarization response.
#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub summary: String,
    pub length: usize,
    pub reading_level: ReadingLevel,
    pub quality_score: f64,
    pub processing_time: f64,
    pub model_used: String,
    pub language: String,
    pub key_points: Vec<String>,
    pub metadata: Value,
}

/// Flesch readability metrics for the summary.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadingLevel {
    pub flesch_ease: f64,
    pub flesch_kincaid: f64,
}

/// Cached summary artifact: the text plus the engine that produced it, so
/// a cache hit reports the same `model_used` as the original miss.
#[derive(Serialize, Deserialize)]
struct CachedSummary {
    summary: String,
    model_used: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    device: String,
    uptime: f64,
    engines: Vec<String>,
}

// ============================================================================
// Validation
// ============================================================================

fn validate(request: &SummarizeRequest) -> Result<()> {
    let title_chars = request.title.chars().count();
    if !(1..=200).contains(&title_chars) {
        return Err(Error::validation(
            "title",
            "must be between 1 and 200 characters",
        ));
    }
    let content_chars = request.content.chars().count();
    if !(100..=10_000).contains(&content_chars) {
        return Err(Error::validation(
            "content",
            "must be between 100 and 10000 characters",
        ));
    }
    if request.content.split_whitespace().count() < 20 {
        return Err(Error::validation("content", "must have at least 20 words"));
    }
    if !(30..=300).contains(&request.length_hint) {
        return Err(Error::validation(
            "length_hint",
            "must be between 30 and 300",
        ));
    }
    if request.language.chars().count() != 2 {
        return Err(Error::validation(
            "language",
            "must be a 2-letter ISO 639-1 code",
        ));
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

async fn summarize(
    State(state): State<SummarizerState>,
    Json(request): Json<SummarizeRequest>,
) -> std::result::Result<Json<SummarizeResponse>, ApiError> {
    if !state.is_ready() {
        return Err(Error::NotReady.into());
    }
    let response = generate_summary(&state, &request).await?;
    Ok(Json(response))
}

async fn summarize_batch(
    State(state): State<SummarizerState>,
    Json(request): Json<BatchSummarizeRequest>,
) -> std::result::Result<Json<Vec<SummarizeResponse>>, ApiError> {
    if !state.is_ready() {
        return Err(Error::NotReady.into());
    }
    if request.articles.len() > MAX_BATCH_ARTICLES {
        return Err(Error::validation(
            "articles",
            format!("maximum {MAX_BATCH_ARTICLES} articles per batch"),
        )
        .into());
    }

    // Items are independent: one failure becomes a placeholder entry and
    // never aborts its siblings.
    let results = join_all(
        request
            .articles
            .iter()
            .map(|article| generate_summary(&state, article)),
    )
    .await;

    let responses = results
        .into_iter()
        .enumerate()
        .map(|(i, result)| {
            result.unwrap_or_else(|e| {
                warn!(index = i, error = %e, "batch article failed");
                error_placeholder(&e)
            })
        })
        .collect();

    Ok(Json(responses))
}

/// Placeholder entry substituted for a failed batch item.
fn error_placeholder(error: &Error) -> SummarizeResponse {
    SummarizeResponse {
        summary: format!("Error processing article: {error}"),
        length: 0,
        reading_level: ReadingLevel {
            flesch_ease: 0.0,
            flesch_kincaid: 0.0,
        },
        quality_score: 0.0,
        processing_time: 0.0,
        model_used: "error".to_string(),
        language: "unknown".to_string(),
        key_points: Vec::new(),
        metadata: json!({ "error": error.to_string() }),
    }
}

async fn health(State(state): State<SummarizerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: if state.is_ready() {
            "healthy"
        } else {
            "loading"
        },
        model_loaded: state.is_ready(),
        device: state.config.device.clone(),
        uptime: state.started.elapsed().as_secs_f64(),
        engines: state.chain.engine_names(),
    })
}

async fn metrics_snapshot(State(state): State<SummarizerState>) -> Json<Value> {
    Json(json!({
        "model_loaded": state.is_ready(),
        "model_name": state.config.model,
        "fallback_model": state.config.fallback_model,
        "device": state.config.device,
        "uptime": state.started.elapsed().as_secs_f64(),
        "cache_artifacts": state.cache.artifact_count(),
    }))
}

// ============================================================================
// Orchestration
// ============================================================================

/// Produce a summary response for one article: cache lookup, engine chain
/// on miss, post-processing, and derived metadata.
async fn generate_summary(
    state: &SummarizerState,
    request: &SummarizeRequest,
) -> Result<SummarizeResponse> {
    let start = Instant::now();
    validate(request)?;

    let clean_content = text::normalize(&request.content);
    let content_words = clean_content.split_whitespace().count();

    let key = CacheKey::compute(&[
        clean_content.as_str(),
        request.title.as_str(),
        &request.length_hint.to_string(),
        request.language.as_str(),
        request.style.as_str(),
    ]);

    let (cached_summary, cache_hit) = match state.cache.lookup(&key, "json") {
        Some(_) => {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL,
                "service" => "summarizer", "operation" => "summarize")
            .increment(1);
            let raw = state.cache.read_text(&key, "json").await?;
            let cached: CachedSummary = serde_json::from_str(&raw)?;
            info!(cache_key = %key, "serving cached summary");
            (cached, true)
        }
        None => {
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL,
                "service" => "summarizer", "operation" => "summarize")
            .increment(1);

            let full_text = format!("{}. {}", request.title, clean_content);
            let bounds = summary_bounds(state.config.as_ref(), request.length_hint, content_words);
            let result = state.chain.summarize(&full_text, bounds).await?;

            let mut summary = result.value.trim().to_string();
            if !summary.ends_with('.') {
                summary.push('.');
            }

            let cached = CachedSummary {
                summary,
                model_used: result.engine,
            };
            let bytes = serde_json::to_vec(&cached)?;
            // A store failure fails the request: the response would
            // otherwise reference an artifact that 404s.
            state.cache.store_bytes(&key, "json", &bytes).await?;
            metrics::counter!(telemetry::ARTIFACT_BYTES_TOTAL, "service" => "summarizer")
                .increment(bytes.len() as u64);
            (cached, false)
        }
    };

    let summary = cached_summary.summary;
    let summary_words = summary.split_whitespace().count();
    let compression_ratio = if content_words > 0 {
        summary_words as f64 / content_words as f64
    } else {
        0.0
    };

    Ok(SummarizeResponse {
        quality_score: quality_score(&clean_content, &summary),
        reading_level: ReadingLevel {
            flesch_ease: text::flesch_reading_ease(&summary),
            flesch_kincaid: text::flesch_kincaid_grade(&summary),
        },
        key_points: key_points(&clean_content, KEY_POINT_COUNT),
        length: summary_words,
        processing_time: start.elapsed().as_secs_f64(),
        model_used: cached_summary.model_used,
        language: request.language.clone(),
        metadata: json!({
            "cached": cache_hit,
            "cache_key": key.as_str(),
            "original_length": content_words,
            "compression_ratio": compression_ratio,
            "title_length": request.title.split_whitespace().count(),
            "processing_device": state.config.device,
        }),
        summary,
    })
}

/// Generation bounds from the caller hint, the content size, and the
/// configured hard limits.
fn summary_bounds(config: &SummarizerConfig, length_hint: u32, content_words: usize) -> SummaryBounds {
    let content_target = (content_words / 10).max(30) as u32;
    let target = length_hint.min(content_target);
    let max_words = (target + 50).min(config.max_summary_length);
    let min_words = target
        .saturating_sub(20)
        .max(config.min_summary_length)
        .min(max_words);
    SummaryBounds {
        min_words,
        max_words,
    }
}
