//! Engine traits for capability-specific implementations.
//!
//! Engines self-report failures through [`crate::Error`]; the failover
//! chain decides which failures are worth handing to the next tier (see
//! [`crate::Error::is_fallback_trigger`]). Engine state is built once at
//! process start and shared read-only across requests, so implementations
//! must be safe for concurrent use without interior mutation.

use std::path::Path;

use async_trait::async_trait;

use crate::Result;

/// Generation bounds for a summary, in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryBounds {
    /// Hard lower bound on summary length.
    pub min_words: u32,
    /// Hard upper bound on summary length.
    pub max_words: u32,
}

/// Provider of abstractive text summaries.
#[async_trait]
pub trait SummaryEngine: Send + Sync {
    /// Engine name, surfaced as `model_used` in responses.
    fn name(&self) -> &str;

    /// Summarize `text` within the given bounds.
    async fn summarize(&self, text: &str, bounds: SummaryBounds) -> Result<String>;
}

/// Voice parameters for one synthesis call.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSpec {
    /// Voice identifier from the catalog.
    pub voice_id: String,
    /// Speech speed multiplier (1.0 = natural).
    pub speed: f64,
    /// Pitch multiplier (1.0 = natural).
    pub pitch: f64,
    /// Volume multiplier (1.0 = unchanged).
    pub volume: f64,
    /// Target sample rate in Hz.
    pub sample_rate: u32,
}

impl Default for VoiceSpec {
    fn default() -> Self {
        Self {
            voice_id: "default".to_string(),
            speed: 1.0,
            pitch: 1.0,
            volume: 1.0,
            sample_rate: 22_050,
        }
    }
}

/// Provider of speech synthesis.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Engine name, surfaced as `voice_used`/engine metadata in responses.
    fn name(&self) -> &str;

    /// Synthesize `text` with the given voice, writing a WAV file to `output`.
    async fn synthesize(&self, text: &str, voice: &VoiceSpec, output: &Path) -> Result<()>;

    /// Whether the engine is usable (binary present, model loadable).
    ///
    /// Consulted once at startup to decide readiness; services answer 503
    /// on mutating endpoints until this passes.
    async fn ready(&self) -> bool {
        true
    }
}
