//! Caption-track cleanup: SRT cue scaffolding down to bare lyric lines.

/// Strip an SRT-style caption track down to its text lines.
///
/// Block indices, `-->` timing lines and blank lines are dropped. A line
/// that repeats the immediately preceding kept line is dropped too, since
/// auto-generated tracks restate the previous cue while extending it.
pub fn to_lyric_text(srt: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    for raw in srt.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if line.contains("-->") {
            continue;
        }
        if kept.last() == Some(&line) {
            continue;
        }
        kept.push(line);
    }
    kept.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_cue_scaffolding_and_consecutive_repeats() {
        let srt = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n2\n00:00:02,000 --> 00:00:03,000\nHello\n\n3\n00:00:03,000 --> 00:00:04,000\nWorld\n";
        assert_eq!(to_lyric_text(srt), "Hello\nWorld");
    }

    #[test]
    fn keeps_nonconsecutive_repeats() {
        let srt = "Hello\nWorld\nHello";
        assert_eq!(to_lyric_text(srt), "Hello\nWorld\nHello");
    }

    #[test]
    fn numeric_lyric_lines_are_indistinguishable_from_indices() {
        // A line of digits is treated as a block index even mid-cue.
        assert_eq!(to_lyric_text("42\nforty-two"), "forty-two");
    }

    #[test]
    fn empty_track_cleans_to_empty() {
        assert_eq!(to_lyric_text(""), "");
        assert_eq!(to_lyric_text("\n\n  \n"), "");
    }
}
