//! Sentence splitting, heuristic scoring, and subtitle timing.
//!
//! The scorer behind key-point extraction favours early, medium-length
//! sentences: `score = 0.7 * position + 0.3 * length` with
//! `position = 1 - 0.3 * (index / sentence_count)` and
//! `length = min(words / 20, 1.0)`. Sentences under five words are not
//! scored at all.
//!
//! Key points and subtitles are cosmetic: an empty result is a valid
//! outcome and never fails the enclosing request.

use std::sync::OnceLock;

use regex::Regex;

/// Minimum word count for a sentence to be scored.
const MIN_SCORED_WORDS: usize = 5;

/// Word count at which the length score saturates.
const OPTIMAL_WORDS: f64 = 20.0;

fn boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+").expect("static regex"))
}

/// Split text into trimmed, non-empty sentences.
///
/// `.`, `!`, and `?` all terminate a sentence, matching the subtitle
/// segmentation of the source pipeline.
pub fn split_sentences(text: &str) -> Vec<String> {
    boundary_re()
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A sentence with its heuristic salience score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSentence {
    /// The sentence text, trimmed.
    pub text: String,
    /// Combined position + length score in (0, 1].
    pub score: f64,
}

/// Score every sentence of at least [`MIN_SCORED_WORDS`] words.
///
/// Returned in document order; position indexes count all sentences, so a
/// skipped short sentence still advances its successors' positions.
pub fn score_sentences(text: &str) -> Vec<ScoredSentence> {
    let sentences = split_sentences(text);
    let count = sentences.len();
    if count == 0 {
        return Vec::new();
    }

    sentences
        .into_iter()
        .enumerate()
        .filter_map(|(index, sentence)| {
            let words = sentence.split_whitespace().count();
            if words < MIN_SCORED_WORDS {
                return None;
            }
            let position = 1.0 - (index as f64 / count as f64) * 0.3;
            let length = (words as f64 / OPTIMAL_WORDS).min(1.0);
            Some(ScoredSentence {
                text: sentence,
                score: position * 0.7 + length * 0.3,
            })
        })
        .collect()
}

/// Extract the top `n` sentences by score, highest first.
pub fn key_points(text: &str, n: usize) -> Vec<String> {
    let mut scored = score_sentences(text);
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.into_iter().take(n).map(|s| s.text).collect()
}

/// A subtitle segment with its display window.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    /// 1-based position of the sentence in the source text.
    pub index: usize,
    /// Display start, seconds from stream start.
    pub start: f64,
    /// Display end, seconds from stream start.
    pub end: f64,
    /// Cue text.
    pub text: String,
}

/// Evenly time-slice sentences across the audio duration, in document order.
///
/// Every sentence owns an equal slice of the timeline whether or not it is
/// emitted; sentences of three characters or fewer are dropped, leaving a
/// silent gap where they would have shown.
pub fn subtitle_cues(text: &str, audio_duration: f64) -> Vec<SubtitleCue> {
    let sentences = split_sentences(text);
    if sentences.is_empty() || audio_duration <= 0.0 {
        return Vec::new();
    }

    let per_sentence = audio_duration / sentences.len() as f64;
    sentences
        .into_iter()
        .enumerate()
        .filter(|(_, s)| s.len() > 3)
        .map(|(i, text)| SubtitleCue {
            index: i + 1,
            start: i as f64 * per_sentence,
            end: ((i + 1) as f64 * per_sentence).min(audio_duration),
            text,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn split_handles_mixed_terminators() {
        let got = split_sentences("First one. Second one! Third one? ");
        assert_eq!(got, vec!["First one", "Second one", "Third one"]);
    }

    #[test]
    fn split_empty_input() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("...!!!").is_empty());
    }

    #[test]
    fn short_sentences_are_excluded_and_position_wins() {
        let text = format!("{}. {}. {}.", words(20), words(3), words(20));
        let scored = score_sentences(&text);

        assert_eq!(scored.len(), 2, "three-word sentence must be excluded");
        // Equal length score, so the earlier sentence wins on position.
        assert!(scored[0].score > scored[1].score);
        assert!(scored[0].text.starts_with("w0"));
    }

    #[test]
    fn key_points_ranked_by_score() {
        let text = format!("{}. {}. {}.", words(20), words(3), words(20));
        let points = key_points(&text, 3);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], words(20));
    }

    #[test]
    fn key_points_empty_when_nothing_qualifies() {
        assert!(key_points("Tiny. Also tiny. No.", 3).is_empty());
    }

    #[test]
    fn length_score_saturates_at_optimal() {
        let text = format!("{}. {}.", words(20), words(40));
        let scored = score_sentences(&text);
        // Both saturate the length component; first sentence wins on position.
        assert!(scored[0].score > scored[1].score);
    }

    #[test]
    fn cues_slice_duration_evenly() {
        let cues = subtitle_cues("Alpha beta gamma. Delta epsilon zeta. Eta theta iota.", 9.0);
        assert_eq!(cues.len(), 3);
        assert_eq!(cues[0].start, 0.0);
        assert!((cues[0].end - 3.0).abs() < 1e-9);
        assert!((cues[2].start - 6.0).abs() < 1e-9);
        assert!((cues[2].end - 9.0).abs() < 1e-9);
    }

    #[test]
    fn cues_drop_very_short_sentences_but_keep_their_slot() {
        let cues = subtitle_cues("A meaningful first sentence. No. The third sentence.", 9.0);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].index, 1);
        // The dropped middle sentence still owns [3, 6); the third keeps its slot.
        assert_eq!(cues[1].index, 3);
        assert!((cues[1].start - 6.0).abs() < 1e-9);
    }

    #[test]
    fn cues_empty_for_zero_duration() {
        assert!(subtitle_cues("Something here.", 0.0).is_empty());
    }
}
