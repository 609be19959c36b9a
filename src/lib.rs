//! Newsreel - automated news-video pipeline services
//!
//! Three HTTP+JSON microservices that turn a news article into a narrated
//! video: summarization (`summarizerd`), speech synthesis (`speechd`), and
//! video assembly (`videod`). Each service is a thin adapter over an
//! external capability — a hosted summarization model, a neural TTS engine,
//! FFmpeg — wrapped in the same request shape: validate, gate on the
//! internal secret, consult the content-addressed artifact cache, invoke
//! the engine chain (primary plus one fallback tier) on a miss, persist,
//! and answer with an artifact URL plus derived metadata.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use newsreel::providers::{InferenceClient, SummaryBounds, SummaryChain};
//!
//! #[tokio::main]
//! async fn main() -> newsreel::Result<()> {
//!     let primary = InferenceClient::new(
//!         "https://api-inference.huggingface.co",
//!         "hf_your_key",
//!         "facebook/bart-large-cnn",
//!     );
//!     let fallback = InferenceClient::new(
//!         "https://api-inference.huggingface.co",
//!         "hf_your_key",
//!         "t5-small",
//!     );
//!     let chain = SummaryChain::new(Arc::new(primary), Some(Arc::new(fallback)));
//!
//!     let result = chain
//!         .summarize(
//!             "Scientists announced a breakthrough today...",
//!             SummaryBounds { min_words: 30, max_words: 150 },
//!         )
//!         .await?;
//!
//!     println!("[{}] {}", result.engine, result.value);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod media;
pub mod providers;
pub mod server;
pub mod telemetry;
pub mod text;
pub mod version;

// Re-export main types at crate root
pub use cache::{ArtifactCache, ArtifactMeta, CacheKey};
pub use config::{SpeechConfig, SummarizerConfig, VideoConfig};
pub use error::{Error, Result};
pub use version::PKG_VERSION;
