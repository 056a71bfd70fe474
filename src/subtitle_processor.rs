use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

// @module: SRT cue codec

// @const: Blank-line block separator
static BLOCK_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n\n+").expect("block separator regex is valid")
});

// @struct: One SRT cue
//
// The number and timecode lines are opaque: they are carried through
// byte-for-byte and never re-parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleCue {
    // @field: Sequence number line
    pub number: String,

    // @field: Timecode line
    pub timecode: String,

    // @field: Cue text, may span several lines
    pub text: String,
}

impl SubtitleCue {
    pub fn new(number: impl Into<String>, timecode: impl Into<String>, text: impl Into<String>) -> Self {
        SubtitleCue {
            number: number.into(),
            timecode: timecode.into(),
            text: text.into(),
        }
    }

    /// Same cue with different text
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        SubtitleCue {
            number: self.number.clone(),
            timecode: self.timecode.clone(),
            text: text.into(),
        }
    }
}

impl fmt::Display for SubtitleCue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\n{}\n{}", self.number, self.timecode, self.text)
    }
}

/// Split SRT content into cues
///
/// Blocks are separated by one or more blank lines. A block with fewer than
/// three lines is skipped. Line 1 is the number, line 2 the timecode and the
/// remaining lines, joined by newlines, the text.
pub fn parse_srt_cues(content: &str) -> Vec<SubtitleCue> {
    let normalized = content.replace("\r\n", "\n");

    BLOCK_SEPARATOR
        .split(normalized.trim())
        .filter_map(|block| {
            let lines: Vec<&str> = block.trim().split('\n').collect();
            if lines.len() < 3 {
                return None;
            }

            Some(SubtitleCue {
                number: lines[0].trim().to_string(),
                timecode: lines[1].trim().to_string(),
                text: lines[2..].join("\n").trim().to_string(),
            })
        })
        .collect()
}

/// Render cues back to SRT
///
/// Cues are separated by a blank line and the output ends with exactly one
/// newline. An empty slice gives an empty string.
pub fn reassemble_srt(cues: &[SubtitleCue]) -> String {
    if cues.is_empty() {
        return String::new();
    }

    let blocks: Vec<String> = cues.iter().map(|cue| cue.to_string()).collect();
    let mut output = blocks.join("\n\n");
    output.push('\n');
    output
}

/// Format milliseconds as an SRT timestamp (HH:MM:SS,mmm)
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Format fractional seconds as an SRT timestamp, rounded to the millisecond
pub fn format_seconds(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return format_timestamp(0);
    }
    format_timestamp((seconds * 1000.0).round() as u64)
}

/// Timecode line for a cue spanning `start`..`end` seconds
pub fn timecode_line(start: f64, end: f64) -> String {
    format!("{} --> {}", format_seconds(start), format_seconds(end))
}
