//! Text rendering of the lyric window for a terminal.

use colored::{Color, Colorize};
use lyrebird_core::{
    progress_label, DisplayLine, HighlightColor, LineGeometry, LyricsDisplay, Viewport,
};
use std::time::Duration;

/// Lyric surface made of fixed-height terminal rows.
///
/// Every line takes one row. A negative scroll position leaves blank rows
/// above the first line, which is how a short window ends up centred. A
/// progress row follows the viewport once a song is playing.
pub struct TerminalDisplay {
    lines: Vec<DisplayLine>,
    rows: u16,
    color: Color,
    scroll_top: i64,
    progress: Option<String>,
    last_frame: Option<String>,
}

impl TerminalDisplay {
    #[must_use]
    pub const fn new(rows: u16, highlight: HighlightColor) -> Self {
        Self {
            lines: Vec::new(),
            rows,
            color: highlight_color(highlight),
            scroll_top: 0,
            progress: None,
            last_frame: None,
        }
    }

    /// Update the `m:ss / m:ss` row shown under the lyrics
    pub fn set_progress(&mut self, position: Duration, duration: Option<Duration>) {
        self.progress = Some(progress_label(position, duration));
    }

    /// Render the viewport as text
    #[must_use]
    pub fn frame(&self) -> String {
        let mut rows: Vec<String> = (0..i64::from(self.rows))
            .map(|row| {
                usize::try_from(self.scroll_top + row)
                    .ok()
                    .and_then(|i| self.lines.get(i))
                    .map_or_else(String::new, |line| self.format_line(line))
            })
            .collect();

        if let Some(progress) = &self.progress {
            rows.push(format!("[{progress}]").dimmed().to_string());
        }
        rows.join("\n")
    }

    /// The current frame, if it differs from the last one taken
    pub fn take_frame(&mut self) -> Option<String> {
        let frame = self.frame();
        if self.last_frame.as_ref() == Some(&frame) {
            return None;
        }
        self.last_frame = Some(frame.clone());
        Some(frame)
    }

    fn format_line(&self, line: &DisplayLine) -> String {
        if line.highlighted {
            format!("> {}", line.text)
                .color(self.color)
                .bold()
                .to_string()
        } else {
            format!("  {}", line.text)
        }
    }
}

const fn highlight_color(color: HighlightColor) -> Color {
    match color {
        HighlightColor::Red => Color::Red,
        HighlightColor::Green => Color::Green,
        HighlightColor::Yellow => Color::Yellow,
        HighlightColor::Blue => Color::Blue,
        HighlightColor::Magenta => Color::Magenta,
        HighlightColor::Cyan => Color::Cyan,
        HighlightColor::White => Color::White,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn row_offset(scroll_top: f64) -> i64 {
    scroll_top.round() as i64
}

impl LyricsDisplay for TerminalDisplay {
    fn replace_lines(&mut self, lines: Vec<DisplayLine>) {
        self.lines = lines;
    }

    fn line_geometry(&self, index: usize) -> Option<LineGeometry> {
        let row = self.lines.iter().position(|line| line.index == index)?;
        let row = u32::try_from(row).ok()?;
        Some(LineGeometry {
            offset_top: f64::from(row),
            height: 1.0,
        })
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            offset_top: 0.0,
            height: f64::from(self.rows),
        }
    }

    fn set_scroll_top(&mut self, scroll_top: f64) {
        self.scroll_top = row_offset(scroll_top);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(index: usize, text: &str, highlighted: bool) -> DisplayLine {
        DisplayLine {
            index,
            text: text.to_string(),
            highlighted,
        }
    }

    #[test]
    fn test_geometry_follows_row_order() {
        let mut display = TerminalDisplay::new(5, HighlightColor::Cyan);
        display.replace_lines(vec![line(3, "a", false), line(4, "b", true)]);

        assert_eq!(
            display.line_geometry(4),
            Some(LineGeometry {
                offset_top: 1.0,
                height: 1.0
            })
        );
        assert_eq!(display.line_geometry(7), None);
    }

    #[test]
    fn test_centred_frame() {
        let mut display = TerminalDisplay::new(5, HighlightColor::Cyan);
        display.replace_lines(vec![
            line(0, "one", false),
            line(1, "two", true),
            line(2, "three", false),
        ]);
        // centre of row 1 onto the centre of 5 rows
        display.set_scroll_top(-1.0);

        let frame = display.frame();
        let rows: Vec<_> = frame.split('\n').collect();
        let highlighted = "> two".cyan().bold().to_string();
        assert_eq!(rows, vec!["", "  one", highlighted.as_str(), "  three", ""]);
    }

    #[test]
    fn test_highlight_color_mapping() {
        assert_eq!(highlight_color(HighlightColor::Magenta), Color::Magenta);
        assert_eq!(highlight_color(HighlightColor::White), Color::White);

        let mut display = TerminalDisplay::new(3, HighlightColor::Magenta);
        display.replace_lines(vec![line(0, "la", true)]);
        assert!(display
            .frame()
            .starts_with(&"> la".magenta().bold().to_string()));
    }

    #[test]
    fn test_progress_row_follows_lyrics() {
        let mut display = TerminalDisplay::new(3, HighlightColor::Cyan);
        display.replace_lines(vec![line(0, "la", true)]);
        display.set_progress(Duration::from_secs(42), Some(Duration::from_secs(190)));

        let frame = display.frame();
        let rows: Vec<_> = frame.split('\n').collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3], "[0:42 / 3:10]".dimmed().to_string());
    }

    #[test]
    fn test_take_frame_only_on_change() {
        let mut display = TerminalDisplay::new(3, HighlightColor::Cyan);
        display.replace_lines(vec![line(0, "la", true)]);

        assert!(display.take_frame().is_some());
        assert!(display.take_frame().is_none());

        display.replace_lines(vec![line(0, "la", false), line(1, "di", true)]);
        assert!(display.take_frame().is_some());

        // a new second on the clock is a new frame even with the same lyrics
        display.set_progress(Duration::from_secs(1), None);
        assert!(display.take_frame().is_some());
        display.set_progress(Duration::from_millis(1_400), None);
        assert!(display.take_frame().is_none());
    }
}
