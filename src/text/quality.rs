//! ROUGE-style summary quality scoring.
//!
//! `quality = 0.7 * rouge + 0.3 * length_penalty`, where `rouge` averages
//! ROUGE-1 F1 (unigram overlap) and ROUGE-L F1 (longest common
//! subsequence), and the length penalty rewards summaries near 10% of the
//! original's word count.
//!
//! The score is advisory metadata, never a gate: degenerate inputs produce
//! the neutral 0.5 instead of an error.

use std::collections::HashMap;

/// Neutral score returned when the overlap computation cannot run.
const NEUTRAL_SCORE: f64 = 0.5;

/// Target summary/original length ratio.
const TARGET_RATIO: f64 = 0.1;

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn f1(overlap: f64, reference_len: usize, candidate_len: usize) -> f64 {
    if reference_len == 0 || candidate_len == 0 {
        return 0.0;
    }
    let precision = overlap / candidate_len as f64;
    let recall = overlap / reference_len as f64;
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// ROUGE-1 F-measure: clipped unigram overlap between the token sequences.
fn rouge1_f1(reference: &[String], candidate: &[String]) -> f64 {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for token in reference {
        *counts.entry(token).or_default() += 1;
    }
    let mut overlap = 0.0;
    for token in candidate {
        if let Some(remaining) = counts.get_mut(token.as_str())
            && *remaining > 0
        {
            *remaining -= 1;
            overlap += 1.0;
        }
    }
    f1(overlap, reference.len(), candidate.len())
}

/// ROUGE-L F-measure: longest common subsequence of the token sequences.
fn rouge_l_f1(reference: &[String], candidate: &[String]) -> f64 {
    let lcs = lcs_len(reference, candidate) as f64;
    f1(lcs, reference.len(), candidate.len())
}

fn lcs_len(a: &[String], b: &[String]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    // Single-row DP keeps memory at O(min side) for long articles.
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut row = vec![0usize; short.len() + 1];
    for token in long {
        let mut diagonal = 0;
        for (j, other) in short.iter().enumerate() {
            let up = row[j + 1];
            row[j + 1] = if token == other {
                diagonal + 1
            } else {
                up.max(row[j])
            };
            diagonal = up;
        }
    }
    row[short.len()]
}

/// Score a summary against its source text; always within [0, 1].
pub fn quality_score(original: &str, summary: &str) -> f64 {
    let reference = tokenize(original);
    let candidate = tokenize(summary);
    if reference.is_empty() || candidate.is_empty() {
        return NEUTRAL_SCORE;
    }

    let rouge = (rouge1_f1(&reference, &candidate) + rouge_l_f1(&reference, &candidate)) / 2.0;

    let ratio = candidate.len() as f64 / reference.len() as f64;
    let length_penalty = (1.0 - (ratio - TARGET_RATIO).abs() * 2.0).clamp(0.0, 1.0);

    (rouge * 0.7 + length_penalty * 0.3).clamp(0.0, 1.0)
}
