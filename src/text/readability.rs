//! Flesch readability metrics.
//!
//! Reported alongside each summary so downstream editors can spot outputs
//! that drifted into academic register. Syllables are estimated by counting
//! vowel groups with a silent-`e` correction; the absolute numbers are
//! approximate, the relative ordering is what matters.

use super::sentences::split_sentences;

/// Estimate syllables in a single word.
fn syllables_in(word: &str) -> usize {
    let lower = word.to_lowercase();
    let mut count = 0;
    let mut in_group = false;
    for c in lower.chars() {
        let is_vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if is_vowel && !in_group {
            count += 1;
        }
        in_group = is_vowel;
    }
    if lower.ends_with('e') && !lower.ends_with("le") && count > 1 {
        count -= 1;
    }
    count.max(1)
}

fn counts(text: &str) -> Option<(f64, f64, f64)> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }
    let sentences = split_sentences(text).len().max(1) as f64;
    let syllables: usize = words.iter().map(|w| syllables_in(w)).sum();
    Some((words.len() as f64, sentences, syllables as f64))
}

/// Flesch reading ease: higher is easier, typical news prose lands 50–70.
pub fn flesch_reading_ease(text: &str) -> f64 {
    let Some((words, sentences, syllables)) = counts(text) else {
        return 0.0;
    };
    206.835 - 1.015 * (words / sentences) - 84.6 * (syllables / words)
}

/// Flesch-Kincaid grade level.
pub fn flesch_kincaid_grade(text: &str) -> f64 {
    let Some((words, sentences, syllables)) = counts(text) else {
        return 0.0;
    };
    0.39 * (words / sentences) + 11.8 * (syllables / words) - 15.59
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syllable_estimates() {
        assert_eq!(syllables_in("cat"), 1);
        assert_eq!(syllables_in("water"), 2);
        assert_eq!(syllables_in("table"), 2);
        assert_eq!(syllables_in("made"), 1);
        // Minimum of one even for degenerate tokens.
        assert_eq!(syllables_in("tsk"), 1);
    }

    #[test]
    fn simple_prose_reads_easier_than_dense_prose() {
        let simple = "The cat sat. The dog ran. It was fun.";
        let dense = "Notwithstanding considerable organizational complexities, \
                     interdepartmental communication necessitates systematic prioritization.";
        assert!(flesch_reading_ease(simple) > flesch_reading_ease(dense));
        assert!(flesch_kincaid_grade(simple) < flesch_kincaid_grade(dense));
    }

    #[test]
    fn empty_text_scores_zero() {
        assert_eq!(flesch_reading_ease(""), 0.0);
        assert_eq!(flesch_kincaid_grade("   "), 0.0);
    }
}
