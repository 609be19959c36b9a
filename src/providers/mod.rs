//! Capability engines and the failover chain that orchestrates them.
//!
//! Engines implement capability-specific traits ([`SummaryEngine`],
//! [`SpeechEngine`]) rather than a single "god trait". The
//! [`failover`] module holds providers in priority order and records which
//! tier actually produced each artifact, so callers can distinguish
//! degraded responses.

pub mod failover;
pub mod inference;
pub mod speech;
pub mod traits;

pub use failover::{Engined, SpeechChain, SummaryChain};
pub use inference::InferenceClient;
pub use speech::{CommandSpeechEngine, VoiceInfo, builtin_voices};
pub use traits::{SpeechEngine, SummaryBounds, SummaryEngine, VoiceSpec};
