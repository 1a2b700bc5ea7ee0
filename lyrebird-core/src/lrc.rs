use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

/// Leading `[minutes:seconds.fraction]` tag. The fraction is mandatory and the
/// captured text stops at a carriage return so CRLF input yields clean lines.
#[allow(clippy::expect_used)]
static CUE_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[([0-9]+):([0-9]+\.[0-9]+)\]([^\r]*)").expect("cue tag pattern is valid")
});

/// A single time-tagged lyric line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub start_time: Duration,
    pub text: String,
}

impl Cue {
    #[must_use]
    pub fn new(start_time: Duration, text: impl Into<String>) -> Self {
        Self {
            start_time,
            text: text.into(),
        }
    }
}

/// Parsed lyrics for one song.
///
/// Cues keep the order of their source lines. Nothing is sorted or
/// deduplicated, so the sheet is only as monotonic as the file it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueSheet {
    cues: Vec<Cue>,
}

impl CueSheet {
    /// Parse time-tagged lyric text.
    ///
    /// Lines without a leading tag are skipped rather than reported.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let cues = input.split('\n').filter_map(parse_cue_line).collect();
        Self { cues }
    }

    #[must_use]
    pub const fn from_cues(cues: Vec<Cue>) -> Self {
        Self { cues }
    }

    #[must_use]
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Cue> {
        self.cues.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

/// Parse a single line like `[2:15.50]Hello`
fn parse_cue_line(line: &str) -> Option<Cue> {
    let caps = CUE_TAG_RE.captures(line)?;

    let minutes: f64 = caps[1].parse().ok()?;
    let seconds: f64 = caps[2].parse().ok()?;

    // Absurdly long digit runs overflow Duration; treat them like any other bad tag
    let start_time = Duration::try_from_secs_f64(minutes * 60.0 + seconds).ok()?;

    Some(Cue {
        start_time,
        text: caps[3].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_line() {
        let sheet = CueSheet::parse("[2:15.50]Hello");
        assert_eq!(sheet.len(), 1);
        assert_eq!(sheet.cues()[0].start_time, Duration::from_millis(135_500));
        assert_eq!(sheet.cues()[0].text, "Hello");
    }

    #[test]
    fn test_malformed_lines_dropped() {
        let sheet = CueSheet::parse("no tag here\n[1:00.0]Valid");
        assert_eq!(sheet.len(), 1);
        assert_eq!(sheet.cues()[0].start_time, Duration::from_secs(60));
        assert_eq!(sheet.cues()[0].text, "Valid");
    }

    #[test]
    fn test_empty_input() {
        assert!(CueSheet::parse("").is_empty());
    }

    #[test]
    fn test_fraction_is_mandatory() {
        assert!(CueSheet::parse("[1:00]No fraction").is_empty());
        assert!(CueSheet::parse("[1:00.]Dangling dot").is_empty());
    }

    #[test]
    fn test_tag_without_text() {
        let sheet = CueSheet::parse("[0:05.00]");
        assert_eq!(sheet.len(), 1);
        assert_eq!(sheet.cues()[0].text, "");
        assert_eq!(sheet.cues()[0].start_time, Duration::from_secs(5));
    }

    #[test]
    fn test_text_whitespace_preserved() {
        let sheet = CueSheet::parse("[0:01.00]  spaced out  ");
        assert_eq!(sheet.cues()[0].text, "  spaced out  ");
    }

    #[test]
    fn test_tag_must_lead_the_line() {
        assert!(CueSheet::parse("intro [0:01.00]late tag").is_empty());
        assert!(CueSheet::parse(" [0:01.00]indented").is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let sheet = CueSheet::parse("[0:01.00]First\r\n[0:02.00]Second\r\n");
        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.cues()[0].text, "First");
        assert_eq!(sheet.cues()[1].text, "Second");
    }

    #[test]
    fn test_source_order_kept() {
        let sheet = CueSheet::parse("[0:20.00]Later\n[0:10.00]Earlier\n[0:10.00]Earlier");
        let texts: Vec<_> = sheet.cues().iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["Later", "Earlier", "Earlier"]);
    }

    #[test]
    fn test_id_tags_are_not_cues() {
        let input = "[ti:Song Title]\n[ar:Artist]\n[00:05.00]Lyrics here";
        let sheet = CueSheet::parse(input);
        assert_eq!(sheet.len(), 1);
        assert_eq!(sheet.cues()[0].text, "Lyrics here");
    }

    #[test]
    fn test_long_minutes() {
        let sheet = CueSheet::parse("[125:00.25]Epic");
        assert_eq!(sheet.cues()[0].start_time, Duration::from_millis(7_500_250));
    }

    #[test]
    fn test_non_ascii_digits_rejected() {
        assert!(CueSheet::parse("[١:00.00]Arabic-Indic digits").is_empty());
    }

    #[test]
    fn test_cjk_lyrics() {
        let sheet = CueSheet::parse("[00:05.00]你好世界");
        assert_eq!(sheet.cues()[0].text, "你好世界");
    }
}
