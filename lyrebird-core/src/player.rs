use crate::error::{CoreError, Result};
use crate::lrc::CueSheet;
use crate::sync::{DisplayWindow, LyricWindowResolver};
use std::sync::Arc;
use std::time::Duration;

/// Identifies one song selection.
///
/// Every selection bumps the generation, so work started for an earlier
/// selection can be recognised and dropped when it completes late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SongTicket {
    pub song_index: usize,
    pub generation: u64,
}

/// What a play/pause toggle asks the media element to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayPause {
    Pause,
    Resume,
    /// Nothing selected yet; start the first song
    StartFirstSong,
}

/// Outcome of delivering lyrics to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricsApply {
    /// The cue sheet was replaced
    Applied,
    /// The delivery belonged to an earlier selection and was dropped
    Stale,
    /// Loading failed; the previous cue sheet is kept
    Failed,
}

/// Player state.
///
/// Transitions consume the state and return the next one, so each can be
/// exercised without a media element.
#[derive(Debug, Clone, Default)]
pub struct PlayerState {
    current_song: Option<usize>,
    is_playing: bool,
    is_looping: bool,
    lyrics: Arc<CueSheet>,
    generation: u64,
}

impl PlayerState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn current_song(&self) -> Option<usize> {
        self.current_song
    }

    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.is_playing
    }

    #[must_use]
    pub const fn is_looping(&self) -> bool {
        self.is_looping
    }

    #[must_use]
    pub fn lyrics(&self) -> &CueSheet {
        &self.lyrics
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `ticket` still describes the current selection
    #[must_use]
    pub fn is_current(&self, ticket: SongTicket) -> bool {
        ticket.generation == self.generation && self.current_song == Some(ticket.song_index)
    }

    /// Select a song. Playback counts as stopped until the media element
    /// confirms it started.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SongOutOfRange`] if `index` is not below `song_count`.
    pub fn select_song(mut self, index: usize, song_count: usize) -> Result<(Self, SongTicket)> {
        if index >= song_count {
            return Err(CoreError::SongOutOfRange {
                index,
                len: song_count,
            });
        }

        self.current_song = Some(index);
        self.is_playing = false;
        self.generation += 1;

        let ticket = SongTicket {
            song_index: index,
            generation: self.generation,
        };
        Ok((self, ticket))
    }

    #[must_use]
    pub fn playback_started(mut self, ticket: SongTicket) -> Self {
        if self.is_current(ticket) {
            self.is_playing = true;
        }
        self
    }

    #[must_use]
    pub const fn playback_rejected(mut self) -> Self {
        self.is_playing = false;
        self
    }

    #[must_use]
    pub fn toggle_play_pause(mut self) -> (Self, PlayPause) {
        if self.is_playing {
            self.is_playing = false;
            (self, PlayPause::Pause)
        } else if self.current_song.is_some() {
            self.is_playing = true;
            (self, PlayPause::Resume)
        } else {
            (self, PlayPause::StartFirstSong)
        }
    }

    #[must_use]
    pub const fn toggle_loop(mut self) -> Self {
        self.is_looping = !self.is_looping;
        self
    }

    /// Replace the cue sheet if `ticket` is still current
    #[must_use]
    pub fn lyrics_loaded(mut self, ticket: SongTicket, sheet: CueSheet) -> (Self, LyricsApply) {
        if !self.is_current(ticket) {
            return (self, LyricsApply::Stale);
        }

        self.lyrics = Arc::new(sheet);
        (self, LyricsApply::Applied)
    }

    /// Note a failed lyrics load. The previous cue sheet stays in place.
    #[must_use]
    pub fn lyrics_failed(self, ticket: SongTicket) -> (Self, LyricsApply) {
        let outcome = if self.is_current(ticket) {
            LyricsApply::Failed
        } else {
            LyricsApply::Stale
        };
        (self, outcome)
    }

    /// Song to advance to when the current one finishes.
    ///
    /// Looping leaves repetition to the media element, so nothing advances.
    #[must_use]
    pub fn track_ended(&self, song_count: usize) -> Option<usize> {
        if self.is_looping || song_count == 0 {
            return None;
        }

        let next = self.current_song.map_or(0, |i| i + 1);
        Some(if next >= song_count { 0 } else { next })
    }

    /// Lyric window for `position` over the current cue sheet
    #[must_use]
    pub fn window_at(
        &self,
        position: Duration,
        resolver: &LyricWindowResolver,
    ) -> Option<DisplayWindow> {
        resolver.resolve(&self.lyrics, position)
    }

    #[must_use]
    pub const fn loop_status(&self) -> &'static str {
        if self.is_looping {
            "Looping"
        } else {
            "Not looping"
        }
    }
}

/// Convert a 0-100 slider value to a media volume
#[must_use]
pub fn volume_from_percent(percent: u8) -> f32 {
    f32::from(percent.min(100)) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lrc::Cue;

    fn sheet(text: &str) -> CueSheet {
        CueSheet::from_cues(vec![Cue::new(Duration::ZERO, text)])
    }

    #[test]
    fn test_initial_state() {
        let state = PlayerState::new();
        assert_eq!(state.current_song(), None);
        assert!(!state.is_playing());
        assert!(!state.is_looping());
        assert!(state.lyrics().is_empty());
        assert_eq!(state.loop_status(), "Not looping");
    }

    #[test]
    fn test_select_song_out_of_range() {
        let err = PlayerState::new().select_song(3, 3).unwrap_err();
        assert!(matches!(err, CoreError::SongOutOfRange { index: 3, len: 3 }));
    }

    #[test]
    fn test_select_song_waits_for_playback() {
        let (state, ticket) = PlayerState::new().select_song(1, 3).unwrap();
        assert_eq!(state.current_song(), Some(1));
        assert!(!state.is_playing());
        assert_eq!(ticket.song_index, 1);

        let state = state.playback_started(ticket);
        assert!(state.is_playing());
    }

    #[test]
    fn test_playback_rejected_leaves_not_playing() {
        let (state, _) = PlayerState::new().select_song(0, 1).unwrap();
        let state = state.playback_rejected();
        assert!(!state.is_playing());
        assert_eq!(state.current_song(), Some(0));
    }

    #[test]
    fn test_stale_playback_start_ignored() {
        let (state, old) = PlayerState::new().select_song(0, 2).unwrap();
        let (state, _) = state.select_song(1, 2).unwrap();
        assert!(!state.playback_started(old).is_playing());
    }

    #[test]
    fn test_toggle_play_pause() {
        let (state, action) = PlayerState::new().toggle_play_pause();
        assert_eq!(action, PlayPause::StartFirstSong);
        assert!(!state.is_playing());

        let (state, ticket) = state.select_song(0, 1).unwrap();
        let state = state.playback_started(ticket);

        let (state, action) = state.toggle_play_pause();
        assert_eq!(action, PlayPause::Pause);
        assert!(!state.is_playing());

        let (state, action) = state.toggle_play_pause();
        assert_eq!(action, PlayPause::Resume);
        assert!(state.is_playing());
    }

    #[test]
    fn test_toggle_loop() {
        let state = PlayerState::new().toggle_loop();
        assert!(state.is_looping());
        assert_eq!(state.loop_status(), "Looping");
        assert!(!state.toggle_loop().is_looping());
    }

    #[test]
    fn test_lyrics_loaded_for_current_song() {
        let (state, ticket) = PlayerState::new().select_song(0, 2).unwrap();
        let (state, outcome) = state.lyrics_loaded(ticket, sheet("current"));
        assert_eq!(outcome, LyricsApply::Applied);
        assert_eq!(state.lyrics().cues()[0].text, "current");
    }

    #[test]
    fn test_stale_lyrics_discarded() {
        let (state, first) = PlayerState::new().select_song(0, 2).unwrap();
        let (state, second) = state.select_song(1, 2).unwrap();

        let (state, outcome) = state.lyrics_loaded(second, sheet("second"));
        assert_eq!(outcome, LyricsApply::Applied);

        // The first song's fetch finishes last
        let (state, outcome) = state.lyrics_loaded(first, sheet("first"));
        assert_eq!(outcome, LyricsApply::Stale);
        assert_eq!(state.lyrics().cues()[0].text, "second");
    }

    #[test]
    fn test_reselecting_same_song_invalidates_old_ticket() {
        let (state, first) = PlayerState::new().select_song(0, 1).unwrap();
        let (state, _) = state.select_song(0, 1).unwrap();
        let (_, outcome) = state.lyrics_loaded(first, sheet("old"));
        assert_eq!(outcome, LyricsApply::Stale);
    }

    #[test]
    fn test_lyrics_failed_keeps_previous_sheet() {
        let (state, first) = PlayerState::new().select_song(0, 2).unwrap();
        let (state, _) = state.lyrics_loaded(first, sheet("kept"));
        let (state, second) = state.select_song(1, 2).unwrap();

        let (state, outcome) = state.lyrics_failed(second);
        assert_eq!(outcome, LyricsApply::Failed);
        assert_eq!(state.lyrics().cues()[0].text, "kept");

        let (_, outcome) = state.lyrics_failed(first);
        assert_eq!(outcome, LyricsApply::Stale);
    }

    #[test]
    fn test_track_ended_advances_and_wraps() {
        let (state, _) = PlayerState::new().select_song(0, 3).unwrap();
        assert_eq!(state.track_ended(3), Some(1));

        let (state, _) = state.select_song(2, 3).unwrap();
        assert_eq!(state.track_ended(3), Some(0));
    }

    #[test]
    fn test_track_ended_while_looping() {
        let (state, _) = PlayerState::new().select_song(0, 3).unwrap();
        assert_eq!(state.toggle_loop().track_ended(3), None);
    }

    #[test]
    fn test_window_at_uses_current_sheet() {
        let (state, ticket) = PlayerState::new().select_song(0, 1).unwrap();
        let resolver = LyricWindowResolver::default();
        assert_eq!(state.window_at(Duration::ZERO, &resolver), None);

        let (state, _) = state.lyrics_loaded(ticket, sheet("only"));
        let window = state.window_at(Duration::from_secs(5), &resolver).unwrap();
        assert_eq!(window.active, 0);
    }

    #[test]
    fn test_volume_from_percent() {
        assert!((volume_from_percent(50) - 0.5).abs() < f32::EPSILON);
        assert!((volume_from_percent(100) - 1.0).abs() < f32::EPSILON);
        assert!((volume_from_percent(250) - 1.0).abs() < f32::EPSILON);
        assert!(volume_from_percent(0).abs() < f32::EPSILON);
    }
}
