//! Video-assembly service: routes, validation, and orchestration.

use std::path::PathBuf;
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
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::cache::{ArtifactCache, CacheKey};
use crate::config::VideoConfig;
use crate::media::ffmpeg::{CARD_HEIGHT, CARD_WIDTH, TITLE_SECONDS};
use crate::media::{CardSpec, MediaToolkit, RenderPlan, Theme, render_srt};
use crate::telemetry;
use crate::text::{self, subtitle_cues};
use crate::{Error, Result};

use super::auth;
use super::error::ApiError;

/// Maximum number of still images composited into one video.
const MAX_IMAGES: usize = 5;

/// Shared state for the video service.
#[derive(Clone)]
pub struct VideoState {
    config: Arc<VideoConfig>,
    toolkit: Arc<MediaToolkit>,
    /// Final artifacts (videos, thumbnails, subtitles), key-addressed.
    output: Arc<ArtifactCache>,
    /// Scratch space for downloaded intermediates.
    scratch_dir: PathBuf,
    http: reqwest::Client,
    started: Instant,
    ready: Arc<AtomicBool>,
}

impl VideoState {
    /// Build service state; opens the output and scratch directories.
    pub fn new(config: VideoConfig, toolkit: MediaToolkit) -> Result<Self> {
        let output = ArtifactCache::open(&config.output_dir)?;
        std::fs::create_dir_all(&config.cache_dir)?;
        Ok(Self {
            scratch_dir: config.cache_dir.clone(),
            config: Arc::new(config),
            toolkit: Arc::new(toolkit),
            output: Arc::new(output),
            http: reqwest::Client::new(),
            started: Instant::now(),
            ready: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Probe FFmpeg availability once and record readiness.
    pub async fn check_readiness(&self) -> bool {
        let ready = self.toolkit.available().await;
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

/// Build the video service router.
pub fn router(state: VideoState) -> Router {
    let secret = Arc::new(state.config.secret.clone());
    let gated = Router::new()
        .route("/render", post(render))
        .route("/thumbnail", post(thumbnail))
        .route_layer(middleware::from_fn_with_state(
            secret,
            auth::require_bearer,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_snapshot))
        .route("/video/{filename}", get(video_file))
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

/// One video render request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Narration text, also used for subtitles.
    pub summary_text: String,
    /// URL of the narration audio artifact.
    pub audio_url: String,
    /// Video title, shown on the opening card.
    pub title: String,
    /// Visual theme name.
    #[serde(default)]
    pub theme: Option<String>,
    /// Explicit duration in seconds; defaults to the audio duration.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Still image URLs shown with a slow pan after the title.
    #[serde(default)]
    pub images: Vec<String>,
}

/// One thumbnail card request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailRequest {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default = "default_layout")]
    pub layout: String,
}

fn default_layout() -> String {
    "default".to_string()
}

/// One video render response.
#[derive(Debug, Serialize, Deserialize)]
pub struct VideoResponse {
    pub video_url: String,
    pub thumbnail_url: String,
    pub subtitle_url: Option<String>,
    pub duration: f64,
    pub resolution: String,
    pub file_size: u64,
    pub processing_time: f64,
    pub metadata: Value,
}

/// One thumbnail response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ThumbnailResponse {
    pub thumbnail_url: String,
    pub dimensions: Value,
    pub file_size: u64,
    pub format: String,
    pub processing_time: f64,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    ffmpeg_available: bool,
    themes_loaded: usize,
    uptime: f64,
}

// ============================================================================
// Validation
// ============================================================================

fn validate_render(request: &RenderRequest, config: &VideoConfig) -> Result<()> {
    let summary_chars = request.summary_text.trim().chars().count();
    if !(10..=2_000).contains(&summary_chars) {
        return Err(Error::validation(
            "summary_text",
            "must be between 10 and 2000 characters",
        ));
    }
    let title_chars = request.title.chars().count();
    if !(5..=100).contains(&title_chars) {
        return Err(Error::validation(
            "title",
            "must be between 5 and 100 characters",
        ));
    }
    if request.audio_url.trim().is_empty() {
        return Err(Error::validation("audio_url", "must not be empty"));
    }
    if let Some(duration) = request.duration {
        let max = config.max_video_length as f64;
        if !(5.0..=300.0).contains(&duration) || duration > max {
            return Err(Error::validation(
                "duration",
                format!("must be between 5 and {} seconds", max.min(300.0)),
            ));
        }
    }
    Ok(())
}

fn validate_thumbnail(request: &ThumbnailRequest) -> Result<()> {
    let title_chars = request.title.chars().count();
    if !(5..=100).contains(&title_chars) {
        return Err(Error::validation(
            "title",
            "must be between 5 and 100 characters",
        ));
    }
    if let Some(subtitle) = &request.subtitle
        && subtitle.chars().count() > 200
    {
        return Err(Error::validation("subtitle", "maximum 200 characters"));
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

async fn render(
    State(state): State<VideoState>,
    Json(request): Json<RenderRequest>,
) -> std::result::Result<Json<VideoResponse>, ApiError> {
    if !state.is_ready() {
        return Err(Error::NotReady.into());
    }
    let response = generate_video(&state, &request).await?;
    Ok(Json(response))
}

async fn thumbnail(
    State(state): State<VideoState>,
    Json(request): Json<ThumbnailRequest>,
) -> std::result::Result<Json<ThumbnailResponse>, ApiError> {
    if !state.is_ready() {
        return Err(Error::NotReady.into());
    }
    let response = generate_thumbnail(&state, &request).await?;
    Ok(Json(response))
}

async fn video_file(
    State(state): State<VideoState>,
    UrlPath(filename): UrlPath<String>,
) -> std::result::Result<Response, ApiError> {
    super::files::serve_from_dirs(&[state.output.dir()], &filename).await
}

async fn health(State(state): State<VideoState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: if state.is_ready() {
            "healthy"
        } else {
            "loading"
        },
        ffmpeg_available: state.is_ready(),
        themes_loaded: Theme::names().len(),
        uptime: state.started.elapsed().as_secs_f64(),
    })
}

async fn metrics_snapshot(State(state): State<VideoState>) -> Json<Value> {
    Json(json!({
        "ffmpeg_available": state.is_ready(),
        "output_files": state.output.artifact_count(),
        "video_resolution": state.config.resolution(),
        "video_fps": state.config.fps,
        "uptime": state.started.elapsed().as_secs_f64(),
    }))
}

// ============================================================================
// Orchestration
// ============================================================================

/// Download a remote artifact into the scratch directory.
///
/// Failure maps to a client error: the URL came from the caller.
async fn download(state: &VideoState, url: &str, file_name: &str) -> Result<PathBuf> {
    let response = state
        .http
        .get(url)
        .send()
        .await
        .map_err(|e| Error::validation("audio_url", format!("failed to download {url}: {e}")))?;
    if !response.status().is_success() {
        return Err(Error::validation(
            "audio_url",
            format!("failed to download {url}: HTTP {}", response.status()),
        ));
    }
    let bytes = response.bytes().await.map_err(Error::from)?;
    let path = state.scratch_dir.join(file_name);
    tokio::fs::write(&path, &bytes).await?;
    Ok(path)
}

/// Produce a rendered video for one request: cache lookup, downloads,
/// composition with a simplified-plan fallback, thumbnail, SRT sidecar.
async fn generate_video(state: &VideoState, request: &RenderRequest) -> Result<VideoResponse> {
    let start = Instant::now();
    validate_render(request, &state.config)?;

    let summary = text::normalize(&request.summary_text);
    let theme_name = request.theme.as_deref().unwrap_or(&state.config.default_theme);
    let theme = Theme::named_or_default(theme_name);

    let key = CacheKey::compute(&[summary.as_str(), request.audio_url.as_str(), theme.name]);

    if let Some(video_path) = state.output.lookup(&key, "mp4") {
        metrics::counter!(telemetry::CACHE_HITS_TOTAL,
            "service" => "video", "operation" => "render")
        .increment(1);
        info!(cache_key = %key, "serving cached video");
        let toolkit = state.toolkit.clone();
        let probe_path = video_path.clone();
        let meta = state
            .output
            .meta_or_probe(&video_path, || async move { toolkit.probe(&probe_path).await })
            .await?;
        let subtitle_url = state
            .output
            .lookup(&key, "srt")
            .map(|_| format!("/video/{key}.srt"));
        return Ok(VideoResponse {
            video_url: format!("/video/{key}.mp4"),
            thumbnail_url: format!("/video/{key}_thumb.jpg"),
            subtitle_url,
            duration: meta.duration,
            resolution: state.config.resolution(),
            file_size: meta.size,
            processing_time: start.elapsed().as_secs_f64(),
            metadata: json!({ "cached": true, "cache_key": key.as_str(), "theme": theme.name }),
        });
    }

    metrics::counter!(telemetry::CACHE_MISSES_TOTAL,
        "service" => "video", "operation" => "render")
    .increment(1);
    info!(cache_key = %key, theme = theme.name, "rendering new video");

    // Narration audio is the critical input; its duration drives the
    // timeline unless the caller pinned one.
    let audio_path = download(state, &request.audio_url, &format!("audio_{key}.wav")).await?;
    let audio_meta = state.toolkit.probe(&audio_path).await?;
    let duration = request.duration.unwrap_or(audio_meta.duration).max(1.0);

    // Images are cosmetic; a failed download drops that image only.
    let mut image_paths = Vec::new();
    for (i, url) in request.images.iter().take(MAX_IMAGES).enumerate() {
        match download(state, url, &format!("image_{key}_{i}.jpg")).await {
            Ok(path) => image_paths.push(path),
            Err(e) => warn!(url = %url, error = %e, "skipping image"),
        }
    }

    // Subtitle cues and SRT sidecar.
    let cues = subtitle_cues(&summary, duration);
    let subtitle_path = if cues.is_empty() {
        None
    } else {
        let path = state.output.path_for(&key, "srt");
        tokio::fs::write(&path, render_srt(&cues)).await?;
        Some(path)
    };

    let mut plan = RenderPlan {
        width: state.config.width,
        height: state.config.height,
        fps: state.config.fps,
        duration,
        title: request.title.clone(),
        theme,
        audio: audio_path.clone(),
        images: image_paths.clone(),
        subtitles: subtitle_path.clone(),
        font_file: state.config.font_file.clone(),
        video_codec: state.config.video_codec.clone(),
        audio_codec: state.config.audio_codec.clone(),
        simplified: false,
    };

    let video_path = state.output.path_for(&key, "mp4");
    let render_plan_used = match state.toolkit.render(&plan, &video_path).await {
        Ok(()) => "full",
        Err(e) => {
            // One fallback tier: retry with the simplified composition.
            warn!(error = %e, "full render failed, retrying simplified plan");
            metrics::counter!(telemetry::ENGINE_FALLBACKS_TOTAL,
                "service" => "video", "engine" => "ffmpeg-simplified")
            .increment(1);
            plan.simplified = true;
            state
                .toolkit
                .render(&plan, &video_path)
                .await
                .map_err(|e| Error::EnginesExhausted(e.to_string()))?;
            "simplified"
        }
    };

    let thumbnail_path = state.output.dir().join(format!("{key}_thumb.jpg"));
    state
        .toolkit
        .thumbnail_from_video(&video_path, duration / 2.0, &thumbnail_path)
        .await?;

    // Downloaded intermediates are no longer needed.
    let _ = tokio::fs::remove_file(&audio_path).await;
    for path in &image_paths {
        let _ = tokio::fs::remove_file(path).await;
    }

    let meta = state.toolkit.probe(&video_path).await?;
    metrics::counter!(telemetry::ARTIFACT_BYTES_TOTAL, "service" => "video")
        .increment(meta.size);

    info!(
        cache_key = %key,
        duration,
        file_size = meta.size,
        plan = render_plan_used,
        "video rendered"
    );

    Ok(VideoResponse {
        video_url: format!("/video/{key}.mp4"),
        thumbnail_url: format!("/video/{key}_thumb.jpg"),
        subtitle_url: subtitle_path.map(|_| format!("/video/{key}.srt")),
        duration,
        resolution: state.config.resolution(),
        file_size: meta.size,
        processing_time: start.elapsed().as_secs_f64(),
        metadata: json!({
            "cached": false,
            "cache_key": key.as_str(),
            "theme": theme.name,
            "images_used": image_paths.len(),
            "subtitle_segments": cues.len(),
            "render_plan": render_plan_used,
            "title_seconds": TITLE_SECONDS,
        }),
    })
}

/// Produce a standalone thumbnail card.
async fn generate_thumbnail(
    state: &VideoState,
    request: &ThumbnailRequest,
) -> Result<ThumbnailResponse> {
    let start = Instant::now();
    validate_thumbnail(request)?;

    let theme_name = request.theme.as_deref().unwrap_or(&state.config.default_theme);
    let theme = Theme::named_or_default(theme_name);
    let key = CacheKey::compute(&[request.title.as_str(), theme.name, request.layout.as_str()]);
    let file_name = format!("thumb_{key}.jpg");
    let path = state.output.dir().join(&file_name);

    if !path.exists() {
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL,
            "service" => "video", "operation" => "thumbnail")
        .increment(1);
        let card = CardSpec {
            title: request.title.clone(),
            subtitle: request.subtitle.clone(),
            theme,
            font_file: state.config.font_file.clone(),
        };
        state.toolkit.render_card(&card, &path).await?;
    } else {
        metrics::counter!(telemetry::CACHE_HITS_TOTAL,
            "service" => "video", "operation" => "thumbnail")
        .increment(1);
    }

    let file_size = tokio::fs::metadata(&path).await?.len();
    Ok(ThumbnailResponse {
        thumbnail_url: format!("/video/{file_name}"),
        dimensions: json!({ "width": CARD_WIDTH, "height": CARD_HEIGHT }),
        file_size,
        format: "JPEG".to_string(),
        processing_time: start.elapsed().as_secs_f64(),
    })
}
