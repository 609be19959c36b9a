//! Text processing shared by the services.
//!
//! - [`normalize`] — canonical cleanup applied before cache-key computation
//!   and before anything goes downstream.
//! - [`sentences`] — sentence splitting, the heuristic scorer behind
//!   key-point extraction, and subtitle timing.
//! - [`quality`] — ROUGE-style summary quality scoring.
//! - [`readability`] — Flesch reading-ease and Flesch-Kincaid grade.

pub mod normalize;
pub mod quality;
pub mod readability;
pub mod sentences;

pub use normalize::{expand_for_speech, normalize};
pub use quality::quality_score;
pub use readability::{flesch_kincaid_grade, flesch_reading_ease};
pub use sentences::{SubtitleCue, key_points, score_sentences, split_sentences, subtitle_cues};
