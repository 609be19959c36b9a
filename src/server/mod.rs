//! HTTP layer: one axum router per service.
//!
//! All three services share the same surface shape: open `GET /health` and
//! `GET /metrics`, bearer-gated mutating endpoints, and by-name artifact
//! retrieval streaming straight off the cache directories.

pub mod auth;
pub mod error;
pub mod files;
pub mod speech;
pub mod summarizer;
pub mod video;

pub use error::ApiError;
pub use speech::SpeechState;
pub use summarizer::SummarizerState;
pub use video::VideoState;
