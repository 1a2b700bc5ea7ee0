//! Display surface contract and the lyric view that drives it.

use crate::lrc::CueSheet;
use crate::sync::{DisplayWindow, LyricWindowResolver};
use std::time::Duration;

/// One rendered lyric line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    /// Index of the cue within the sheet
    pub index: usize,
    pub text: String,
    pub highlighted: bool,
}

/// Vertical placement of a rendered line, in the surface's own units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineGeometry {
    pub offset_top: f64,
    pub height: f64,
}

/// Vertical placement of the scrolling container
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub offset_top: f64,
    pub height: f64,
}

/// Scroll offset that puts the centre of `line` on the centre of `viewport`
#[must_use]
pub fn centered_scroll_top(line: LineGeometry, viewport: Viewport) -> f64 {
    line.offset_top - viewport.offset_top - viewport.height / 2.0 + line.height / 2.0
}

/// Surface the lyric window is rendered onto.
///
/// Implementations only need to replace their lines wholesale, report where a
/// rendered line ended up, and accept a scroll position.
pub trait LyricsDisplay {
    /// Replace every rendered line with `lines`
    fn replace_lines(&mut self, lines: Vec<DisplayLine>);

    /// Geometry of the rendered line for cue `index`, if it is on screen
    fn line_geometry(&self, index: usize) -> Option<LineGeometry>;

    /// Geometry of the scrolling container
    fn viewport(&self) -> Viewport;

    fn set_scroll_top(&mut self, scroll_top: f64);
}

/// Renders the active lyric window and keeps the highlighted line centred.
#[derive(Debug, Clone, Copy, Default)]
pub struct LyricView {
    resolver: LyricWindowResolver,
}

impl LyricView {
    #[must_use]
    pub const fn new(resolver: LyricWindowResolver) -> Self {
        Self { resolver }
    }

    #[must_use]
    pub const fn resolver(&self) -> &LyricWindowResolver {
        &self.resolver
    }

    /// Render the window for `position` and scroll it into view.
    ///
    /// An empty sheet leaves the display untouched and returns `None`. The
    /// scroll position is reassigned on every call, even when the window did
    /// not change.
    pub fn render<D: LyricsDisplay + ?Sized>(
        &self,
        display: &mut D,
        sheet: &CueSheet,
        position: Duration,
    ) -> Option<DisplayWindow> {
        let window = self.resolver.resolve(sheet, position)?;

        let lines = window
            .lines(sheet)
            .map(|(index, cue, highlighted)| DisplayLine {
                index,
                text: cue.text.clone(),
                highlighted,
            })
            .collect();
        display.replace_lines(lines);

        if let Some(line) = display.line_geometry(window.active) {
            let scroll_top = centered_scroll_top(line, display.viewport());
            display.set_scroll_top(scroll_top);
        }

        Some(window)
    }
}
