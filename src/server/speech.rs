//! Speech-synthesis service: routes, validation, and orchestration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path as UrlPath, State},
    middleware,
    response::Response,
    routing::{get, post},
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::cache::{ArtifactCache, ArtifactMeta, CacheKey};
use crate::config::SpeechConfig;
use crate::media::MediaToolkit;
use crate::providers::{SpeechChain, VoiceInfo, VoiceSpec, builtin_voices};
use crate::telemetry;
use crate::text;
use crate::{Error, Result};

use super::auth;
use super::error::ApiError;

/// Maximum texts per batch request.
const MAX_BATCH_TEXTS: usize = 5;

/// Shared state for the speech service.
#[derive(Clone)]
pub struct SpeechState {
    config: Arc<SpeechConfig>,
    chain: Arc<SpeechChain>,
    toolkit: Arc<MediaToolkit>,
    cache: Arc<ArtifactCache>,
    voices: Arc<Vec<VoiceInfo>>,
    started: Instant,
    ready: Arc<AtomicBool>,
}

impl SpeechState {
    /// Build service state; opens the cache and output directories.
    pub fn new(config: SpeechConfig, chain: SpeechChain, toolkit: MediaToolkit) -> Result<Self> {
        let cache = ArtifactCache::open(&config.cache_dir)?;
        std::fs::create_dir_all(&config.output_dir)?;
        Ok(Self {
            config: Arc::new(config),
            chain: Arc::new(chain),
            toolkit: Arc::new(toolkit),
            cache: Arc::new(cache),
            voices: Arc::new(builtin_voices()),
            started: Instant::now(),
            ready: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Probe the synthesis engine once and record readiness.
    pub async fn check_readiness(&self) -> bool {
        let ready = self.chain.ready().await;
        self.ready.store(ready, Ordering::Release);
        ready
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

/// Build the speech service router.
pub fn router(state: SpeechState) -> Router {
    let secret = Arc::new(state.config.secret.clone());
    let gated = Router::new()
        .route("/tts", post(tts))
        .route("/tts/batch", post(tts_batch))
        .route_layer(middleware::from_fn_with_state(
            secret,
            auth::require_bearer,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_snapshot))
        .route("/voices", get(voices))
        .route("/audio/{filename}", get(audio_file))
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

/// One synthesis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsRequest {
    /// Text to convert to speech.
    pub text: String,
    /// Voice identifier from the catalog.
    #[serde(default = "default_voice")]
    pub voice_id: String,
    /// Speech speed multiplier.
    #[serde(default = "default_multiplier")]
    pub speed: f64,
    /// Pitch multiplier.
    #[serde(default = "default_multiplier")]
    pub pitch: f64,
    /// Volume multiplier.
    #[serde(default = "default_multiplier")]
    pub volume: f64,
    /// Audio sample rate; defaults to the service configuration.
    #[serde(default)]
    pub sample_rate: Option<u32>,
    /// Output audio format.
    #[serde(default)]
    pub format: Option<String>,
}

fn default_voice() -> String {
    "default".to_string()
}

fn default_multiplier() -> f64 {
    1.0
}

/// Batch of synthesis requests sharing one voice.
#[derive(Debug, Deserialize)]
pub struct BatchTtsRequest {
    pub texts: Vec<String>,
    #[serde(default = "default_voice")]
    pub voice_id: String,
    #[serde(default = "default_multiplier")]
    pub speed: f64,
}

/// One synthesis response.
#[derive(Debug, Serialize, Deserialize)]
pub struct TtsResponse {
    pub audio_url: String,
    pub duration: f64,
    pub sample_rate: u32,
    pub format: String,
    pub file_size: u64,
    pub processing_time: f64,
    pub voice_used: String,
    pub metadata: Value,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    available_voices: Vec<String>,
    uptime: f64,
}

// ============================================================================
// Validation
// ============================================================================

fn validate(request: &TtsRequest, config: &SpeechConfig) -> Result<()> {
    if request.text.trim().is_empty() {
        return Err(Error::validation("text", "must not be empty"));
    }
    let chars = request.text.chars().count();
    if chars > config.max_text_length {
        return Err(Error::validation(
            "text",
            format!("maximum {} characters", config.max_text_length),
        ));
    }
    if !(0.5..=2.0).contains(&request.speed) {
        return Err(Error::validation("speed", "must be between 0.5 and 2.0"));
    }
    if !(0.5..=2.0).contains(&request.pitch) {
        return Err(Error::validation("pitch", "must be between 0.5 and 2.0"));
    }
    if !(0.1..=2.0).contains(&request.volume) {
        return Err(Error::validation("volume", "must be between 0.1 and 2.0"));
    }
    if let Some(rate) = request.sample_rate
        && !(8_000..=48_000).contains(&rate)
    {
        return Err(Error::validation(
            "sample_rate",
            "must be between 8000 and 48000",
        ));
    }
    if let Some(format) = &request.format
        && format != &config.audio_format
    {
        return Err(Error::validation(
            "format",
            format!("only {:?} is supported", config.audio_format),
        ));
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

async fn tts(
    State(state): State<SpeechState>,
    Json(request): Json<TtsRequest>,
) -> std::result::Result<Json<TtsResponse>, ApiError> {
    if !state.is_ready() {
        return Err(Error::NotReady.into());
    }
    let response = generate_speech(&state, &request).await?;
    Ok(Json(response))
}

async fn tts_batch(
    State(state): State<SpeechState>,
    Json(request): Json<BatchTtsRequest>,
) -> std::result::Result<Json<Vec<TtsResponse>>, ApiError> {
    if !state.is_ready() {
        return Err(Error::NotReady.into());
    }
    if request.texts.len() > MAX_BATCH_TEXTS {
        return Err(Error::validation(
            "texts",
            format!("maximum {MAX_BATCH_TEXTS} texts per batch"),
        )
        .into());
    }

    let items: Vec<TtsRequest> = request
        .texts
        .iter()
        .map(|text| TtsRequest {
            text: text.clone(),
            voice_id: request.voice_id.clone(),
            speed: request.speed,
            pitch: 1.0,
            volume: 1.0,
            sample_rate: None,
            format: None,
        })
        .collect();

    let results = join_all(items.iter().map(|item| generate_speech(&state, item))).await;

    // Unlike the summarization batch, one failed item aborts the whole
    // batch. Inherited semantics, kept deliberately.
    let mut responses = Vec::with_capacity(results.len());
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Ok(response) => responses.push(response),
            Err(e) => {
                warn!(index = i, error = %e, "batch text failed, aborting batch");
                return Err(ApiError::internal(format!(
                    "failed to process text {i}: {e}"
                )));
            }
        }
    }
    Ok(Json(responses))
}

async fn voices(State(state): State<SpeechState>) -> Json<Vec<VoiceInfo>> {
    Json(state.voices.as_ref().clone())
}

async fn audio_file(
    State(state): State<SpeechState>,
    UrlPath(filename): UrlPath<String>,
) -> std::result::Result<Response, ApiError> {
    super::files::serve_from_dirs(
        &[state.cache.dir(), state.config.output_dir.as_path()],
        &filename,
    )
    .await
}

async fn health(State(state): State<SpeechState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: if state.is_ready() {
            "healthy"
        } else {
            "loading"
        },
        model_loaded: state.is_ready(),
        available_voices: state.voices.iter().map(|v| v.voice_id.clone()).collect(),
        uptime: state.started.elapsed().as_secs_f64(),
    })
}

async fn metrics_snapshot(State(state): State<SpeechState>) -> Json<Value> {
    Json(json!({
        "model_loaded": state.is_ready(),
        "engines": state.chain.engine_names(),
        "available_voices": state.voices.len(),
        "uptime": state.started.elapsed().as_secs_f64(),
        "cache_files": state.cache.artifact_count(),
    }))
}

// ============================================================================
// Orchestration
// ============================================================================

/// Produce an audio response for one text: cache lookup, synthesis chain on
/// miss, FFmpeg post-processing, persistence, and probed metadata.
async fn generate_speech(state: &SpeechState, request: &TtsRequest) -> Result<TtsResponse> {
    let start = Instant::now();
    validate(request, &state.config)?;

    let processed = if state.config.enable_preprocessing {
        text::expand_for_speech(&request.text)
    } else {
        text::normalize(&request.text)
    };

    let voice = VoiceSpec {
        voice_id: request.voice_id.clone(),
        speed: request.speed,
        pitch: request.pitch,
        volume: request.volume,
        sample_rate: request.sample_rate.unwrap_or(state.config.sample_rate),
    };
    let format = request
        .format
        .clone()
        .unwrap_or_else(|| state.config.audio_format.clone());

    let key = CacheKey::compute(&[
        processed.as_str(),
        voice.voice_id.as_str(),
        &format!("{:.2}", voice.speed),
    ]);

    if let Some(path) = state.cache.lookup(&key, &format) {
        metrics::counter!(telemetry::CACHE_HITS_TOTAL,
            "service" => "speech", "operation" => "tts")
        .increment(1);
        info!(cache_key = %key, "serving cached audio");
        let toolkit = state.toolkit.clone();
        let probe_path = path.clone();
        let meta = state
            .cache
            .meta_or_probe(&path, || async move { toolkit.probe(&probe_path).await })
            .await?;
        return Ok(build_response(
            &key, &format, meta, &voice, start, true, &processed, "cache",
        ));
    }

    metrics::counter!(telemetry::CACHE_MISSES_TOTAL,
        "service" => "speech", "operation" => "tts")
    .increment(1);

    // Synthesize into the output directory, then post-process into the cache.
    let raw_path = state.config.output_dir.join(format!("{key}.raw.wav"));
    let synthesis = state.chain.synthesize(&processed, &voice, &raw_path).await?;

    let mut post_processed = false;
    let stored = if state.config.enable_postprocessing {
        let filtered_path = state.config.output_dir.join(format!("{key}.filtered.wav"));
        match state
            .toolkit
            .postprocess_audio(&raw_path, &filtered_path, &voice)
            .await
        {
            Ok(()) => {
                post_processed = true;
                let _ = tokio::fs::remove_file(&raw_path).await;
                state.cache.store_file(&key, &format, &filtered_path).await?
            }
            Err(e) => {
                // The filter pass is an enhancement; raw synthesis output is
                // still a valid artifact.
                warn!(error = %e, "audio post-processing failed, using raw output");
                state.cache.store_file(&key, &format, &raw_path).await?
            }
        }
    } else {
        state.cache.store_file(&key, &format, &raw_path).await?
    };

    let meta = state.toolkit.probe(&stored).await?;
    metrics::counter!(telemetry::ARTIFACT_BYTES_TOTAL, "service" => "speech")
        .increment(meta.size);

    info!(
        cache_key = %key,
        duration = meta.duration,
        engine = %synthesis.engine,
        post_processed,
        "speech generated"
    );

    let mut response = build_response(
        &key,
        &format,
        meta,
        &voice,
        start,
        false,
        &processed,
        &synthesis.engine,
    );
    response.metadata["post_processed"] = json!(post_processed);
    Ok(response)
}

#[allow(clippy::too_many_arguments)]
fn build_response(
    key: &CacheKey,
    format: &str,
    meta: ArtifactMeta,
    voice: &VoiceSpec,
    start: Instant,
    cached: bool,
    processed_text: &str,
    engine: &str,
) -> TtsResponse {
    TtsResponse {
        audio_url: format!("/audio/{key}.{format}"),
        duration: meta.duration,
        sample_rate: voice.sample_rate,
        format: format.to_string(),
        file_size: meta.size,
        processing_time: start.elapsed().as_secs_f64(),
        voice_used: voice.voice_id.clone(),
        metadata: json!({
            "cached": cached,
            "cache_key": key.as_str(),
            "text_length": processed_text.chars().count(),
            "engine": engine,
        }),
    }
}
