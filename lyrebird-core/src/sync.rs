use crate::lrc::{Cue, CueSheet};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Added to the playback position before lookup so a line lights up slightly
/// ahead of its timestamp.
pub const LOOKAHEAD_OFFSET: Duration = Duration::from_millis(500);

/// Contiguous range of cues shown at once: the active line and one neighbour
/// on each side, trimmed at the ends of the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayWindow {
    /// First visible cue index (inclusive)
    pub start: usize,
    /// Last visible cue index (inclusive)
    pub end: usize,
    /// Highlighted cue index
    pub active: usize,
}

impl DisplayWindow {
    /// Build the window around `active` for a sheet of `len` cues.
    ///
    /// Returns `None` when there are no cues to show.
    #[must_use]
    pub fn around(active: usize, len: usize) -> Option<Self> {
        let last = len.checked_sub(1)?;
        let active = active.min(last);

        Some(Self {
            start: active.saturating_sub(1),
            end: (active + 1).min(last),
            active,
        })
    }

    #[must_use]
    pub const fn indices(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start + 1
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Visible cues paired with their index and highlight flag
    pub fn lines<'a>(
        &self,
        sheet: &'a CueSheet,
    ) -> impl Iterator<Item = (usize, &'a Cue, bool)> + 'a {
        let active = self.active;
        self.indices()
            .filter_map(move |i| sheet.get(i).map(|cue| (i, cue, i == active)))
    }
}

/// Resolves which cue is being sung for a playback position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LyricWindowResolver {
    lookahead: Duration,
}

impl Default for LyricWindowResolver {
    fn default() -> Self {
        Self::new(LOOKAHEAD_OFFSET)
    }
}

impl LyricWindowResolver {
    #[must_use]
    pub const fn new(lookahead: Duration) -> Self {
        Self { lookahead }
    }

    #[must_use]
    pub const fn lookahead(&self) -> Duration {
        self.lookahead
    }

    /// Index of the active cue, or `None` for an empty sheet.
    ///
    /// The active cue is the one just before the first cue that starts after
    /// `position + lookahead`. When no cue starts after that point the lookup
    /// falls back to index 0, both before the first cue and past the last one.
    #[must_use]
    pub fn active_index(&self, sheet: &CueSheet, position: Duration) -> Option<usize> {
        if sheet.is_empty() {
            return None;
        }

        let adjusted = position.saturating_add(self.lookahead);
        let index = sheet
            .cues()
            .iter()
            .position(|cue| adjusted < cue.start_time)
            .map_or(0, |next| next.saturating_sub(1));

        Some(index)
    }

    /// Active index plus the window of neighbouring cues
    #[must_use]
    pub fn resolve(&self, sheet: &CueSheet, position: Duration) -> Option<DisplayWindow> {
        let active = self.active_index(sheet, position)?;
        DisplayWindow::around(active, sheet.len())
    }
}

impl CueSheet {
    /// Active cue index using the default lookahead
    #[must_use]
    pub fn active_index(&self, position: Duration) -> Option<usize> {
        LyricWindowResolver::default().active_index(self, position)
    }

    /// Display window using the default lookahead
    #[must_use]
    pub fn window_at(&self, position: Duration) -> Option<DisplayWindow> {
        LyricWindowResolver::default().resolve(self, position)
    }
}
