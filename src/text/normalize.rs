//! Input text normalization.
//!
//! Normalization runs before cache-key computation, so two requests that
//! differ only in incidental whitespace or stray control characters address
//! the same cache entry. The function is idempotent:
//! `normalize(normalize(x)) == normalize(x)`.

use std::sync::OnceLock;

use regex::Regex;

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").expect("static regex"))
}

fn disallowed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Word characters, whitespace, and basic punctuation survive; control
    // characters and decorative symbols do not.
    RE.get_or_init(|| Regex::new(r#"[^\w\s.,!?;:()'"-]+"#).expect("static regex"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Canonicalize caller-supplied text.
///
/// Strips URLs, removes characters outside the word + punctuation alphabet,
/// collapses whitespace runs to single spaces, and trims.
pub fn normalize(text: &str) -> String {
    let text = url_re().replace_all(text, "");
    let text = disallowed_re().replace_all(&text, "");
    whitespace_re().replace_all(&text, " ").trim().to_string()
}

/// Abbreviations expanded before speech synthesis.
const SPOKEN_FORMS: &[(&str, &str)] = &[
    (" Dr.", " Doctor"),
    (" Mr.", " Mister"),
    (" Mrs.", " Missus"),
    (" Ms.", " Miss"),
    (" vs.", " versus"),
    (" etc.", " etcetera"),
    (" i.e.", " that is"),
    (" e.g.", " for example"),
];

/// Prepare text for the TTS engine.
///
/// Expands common abbreviations to their spoken forms and pads sentence
/// punctuation with a trailing space so the engine inserts natural pauses.
/// The result feeds both the synthesis call and the cache key, so it must
/// be deterministic for a given input.
pub fn expand_for_speech(text: &str) -> String {
    let mut text = format!(" {}", whitespace_re().replace_all(text, " ").trim());

    // Abbreviations first: padding would split the trailing period off
    // "e.g." before the lookup table could see it.
    for (abbrev, spoken) in SPOKEN_FORMS {
        text = text.replace(abbrev, spoken);
    }

    for punct in ['.', ',', ';', ':', '!', '?'] {
        text = text.replace(punct, &format!("{punct} "));
    }

    whitespace_re().replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("a  b\t\nc"), "a b c");
    }

    #[test]
    fn strips_urls() {
        assert_eq!(
            normalize("read more at https://example.com/a?b=1 today"),
            "read more at today"
        );
    }

    #[test]
    fn strips_control_and_symbol_characters() {
        assert_eq!(normalize("hello\u{0007} world \u{2764} ok"), "hello world ok");
    }

    #[test]
    fn keeps_basic_punctuation() {
        let text = "Wait - really? Yes: \"quoted\", (aside); done!";
        assert_eq!(normalize(text), text);
    }

    #[test]
    fn idempotent() {
        let inputs = [
            "  plain   text  ",
            "mixed https://u.rl \u{0000} sym\u{2603}bols",
            "Already clean, honestly.",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn speech_expansion_expands_abbreviations() {
        let out = expand_for_speech("Ask Dr. Chen, e.g. tomorrow.");
        assert!(out.contains("Doctor Chen"), "{out}");
        assert!(out.contains("for example"), "{out}");
    }

    #[test]
    fn speech_expansion_is_deterministic() {
        let a = expand_for_speech("One. Two! Three?");
        let b = expand_for_speech("One. Two! Three?");
        assert_eq!(a, b);
    }
}
