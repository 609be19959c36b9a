//! Telemetry metric name constants.
//!
//! Centralised metric names for newsreel operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `newsreel_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `service` — service name ("summarizer", "speech", "video")
//! - `engine` — capability engine that handled the request
//! - `operation` — endpoint invoked (e.g. "summarize", "tts", "render")
//! - `status` — outcome: "ok" or "error"

/// Total requests handled per operation.
///
/// Labels: `service`, `operation`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "newsreel_requests_total";

/// Request duration in seconds.
///
/// Labels: `service`, `operation`.
pub const REQUEST_DURATION_SECONDS: &str = "newsreel_request_duration_seconds";

/// Total artifact cache hits.
///
/// Labels: `service`, `operation`.
pub const CACHE_HITS_TOTAL: &str = "newsreel_cache_hits_total";

/// Total artifact cache misses.
///
/// Labels: `service`, `operation`.
pub const CACHE_MISSES_TOTAL: &str = "newsreel_cache_misses_total";

/// Total invocations answered by a fallback engine tier.
///
/// Labels: `service`, `engine` (the fallback that answered).
pub const ENGINE_FALLBACKS_TOTAL: &str = "newsreel_engine_fallbacks_total";

/// Total bytes written into the artifact cache.
///
/// Labels: `service`.
pub const ARTIFACT_BYTES_TOTAL: &str = "newsreel_artifact_bytes_total";
