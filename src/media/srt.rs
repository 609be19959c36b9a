//! SRT subtitle file rendering.

use crate::text::SubtitleCue;

/// Format seconds as an SRT timestamp: `HH:MM:SS,mmm`.
fn timestamp(seconds: f64) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let millis = total_millis % 1000;
    let total_secs = total_millis / 1000;
    let secs = total_secs % 60;
    let minutes = (total_secs / 60) % 60;
    let hours = total_secs / 3600;
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

/// Render cues to SRT file content.
///
/// Cue indexes are kept as produced by the timing pass; a dropped short
/// sentence leaves a gap in the numbering, mirroring its silent gap on the
/// timeline.
pub fn render_srt(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for cue in cues {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            cue.index,
            timestamp(cue.start),
            timestamp(cue.end),
            cue.text
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_roll_over_units() {
        assert_eq!(timestamp(0.0), "00:00:00,000");
        assert_eq!(timestamp(1.5), "00:00:01,500");
        assert_eq!(timestamp(61.25), "00:01:01,250");
        assert_eq!(timestamp(3661.0), "01:01:01,000");
    }

    #[test]
    fn renders_standard_blocks() {
        let cues = vec![
            SubtitleCue {
                index: 1,
                start: 0.0,
                end: 3.0,
                text: "First line".to_string(),
            },
            SubtitleCue {
                index: 3,
                start: 6.0,
                end: 9.0,
                text: "Third line".to_string(),
            },
        ];
        let srt = render_srt(&cues);
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:03,000\nFirst line\n\n"));
        assert!(srt.contains("3\n00:00:06,000 --> 00:00:09,000\nThird line\n\n"));
    }

    #[test]
    fn empty_cues_render_empty_file() {
        assert_eq!(render_srt(&[]), "");
    }
}
