//! Media element contract and a clock-driven implementation.

use crate::error::{CoreError, Result};
use crate::manifest::Song;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Furthest a seek may go when the song declares no duration
pub const MAX_UNBOUNDED_POSITION: Duration = Duration::from_secs(4_294_967_295);

/// The playback element the player drives.
///
/// Mirrors what an HTML audio element offers: a source, play/pause, a
/// readable and writable position, volume and a loop flag, plus a one-shot
/// "ended" notification.
#[async_trait]
pub trait MediaElement: Send {
    /// Point the element at a song's audio. Playback is stopped and rewound.
    fn load(&mut self, song: &Song);

    /// Current audio source, if one was loaded
    fn source(&self) -> Option<&str>;

    /// Start or resume playback.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PlaybackRejected`] if playback cannot start.
    async fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    fn current_time(&self) -> Duration;

    fn set_current_time(&mut self, position: Duration);

    /// Track length, when known
    fn duration(&self) -> Option<Duration>;

    /// Volume in `0.0..=1.0`
    fn volume(&self) -> f32;

    fn set_volume(&mut self, volume: f32);

    fn is_loop(&self) -> bool;

    fn set_loop(&mut self, looping: bool);

    /// Returns `true` once each time playback runs off the end of the track.
    /// Never fires while looping.
    fn take_ended(&mut self) -> bool;
}

/// Media element that plays a song by running a clock over its declared
/// duration. No audio is decoded.
#[derive(Debug, Clone)]
pub struct ClockMedia {
    source: Option<String>,
    duration: Option<Duration>,
    volume: f32,
    looping: bool,
    /// Position when the clock last (re)started, or the frozen position while paused
    anchor: Duration,
    resumed_at: Option<Instant>,
    /// Directory local sources must exist in before playback is allowed
    file_check: Option<PathBuf>,
}

impl Default for ClockMedia {
    fn default() -> Self {
        Self {
            source: None,
            duration: None,
            volume: 1.0,
            looping: false,
            anchor: Duration::ZERO,
            resumed_at: None,
            file_check: None,
        }
    }
}

impl ClockMedia {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject playback of local sources that do not exist under `base_dir`
    #[must_use]
    pub fn with_file_check(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.file_check = Some(base_dir.into());
        self
    }

    fn raw_position(&self) -> Duration {
        self.anchor
            .saturating_add(self.resumed_at.map_or(Duration::ZERO, |t| t.elapsed()))
    }

    /// Freeze the current position as the new anchor
    fn rebase(&mut self) {
        self.anchor = self.current_time();
        if self.resumed_at.is_some() {
            self.resumed_at = Some(Instant::now());
        }
    }

    fn at_end(&self) -> bool {
        self.duration
            .is_some_and(|d| self.raw_position() >= d)
    }

    async fn check_source(&self, source: &str) -> Result<()> {
        let Some(base_dir) = &self.file_check else {
            return Ok(());
        };
        if source.starts_with("http://") || source.starts_with("https://") {
            return Ok(());
        }

        let path = Path::new(source);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        };

        match tokio::fs::try_exists(&path).await {
            Ok(true) => Ok(()),
            _ => Err(CoreError::PlaybackRejected {
                reason: format!("audio file {} not found", path.display()),
            }),
        }
    }
}

#[async_trait]
impl MediaElement for ClockMedia {
    fn load(&mut self, song: &Song) {
        self.source = Some(song.file.clone());
        self.duration = song.duration();
        self.anchor = Duration::ZERO;
        self.resumed_at = None;
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    async fn play(&mut self) -> Result<()> {
        let Some(source) = self.source.clone() else {
            return Err(CoreError::PlaybackRejected {
                reason: "no source loaded".to_string(),
            });
        };
        self.check_source(&source).await?;

        if self.resumed_at.is_some() {
            return Ok(());
        }
        if !self.looping && self.at_end() {
            debug!("Restarting {} from the beginning", source);
            self.anchor = Duration::ZERO;
        }
        self.resumed_at = Some(Instant::now());
        Ok(())
    }

    fn pause(&mut self) {
        self.anchor = self.current_time();
        self.resumed_at = None;
    }

    fn is_paused(&self) -> bool {
        self.resumed_at.is_none()
    }

    fn current_time(&self) -> Duration {
        let position = self.raw_position();
        match self.duration {
            Some(d) if !d.is_zero() && position >= d => {
                if self.looping {
                    let nanos = position.as_nanos() % d.as_nanos();
                    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
                } else {
                    d
                }
            }
            _ => position,
        }
    }

    fn set_current_time(&mut self, position: Duration) {
        self.anchor = position.min(self.duration.unwrap_or(MAX_UNBOUNDED_POSITION));
        if self.resumed_at.is_some() {
            self.resumed_at = Some(Instant::now());
        }
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn is_loop(&self) -> bool {
        self.looping
    }

    fn set_loop(&mut self, looping: bool) {
        self.rebase();
        self.looping = looping;
    }

    fn take_ended(&mut self) -> bool {
        if self.looping || self.resumed_at.is_none() || !self.at_end() {
            return false;
        }

        self.anchor = self.current_time();
        self.resumed_at = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(seconds: f64) -> Song {
        Song::new("Test", "test.mp3", "test.txt").with_duration(seconds)
    }

    #[tokio::test]
    async fn test_play_without_source_rejected() {
        let mut media = ClockMedia::new();
        assert!(matches!(
            media.play().await,
            Err(CoreError::PlaybackRejected { .. })
        ));
        assert!(media.is_paused());
    }

    #[tokio::test]
    async fn test_missing_local_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut media = ClockMedia::new().with_file_check(dir.path());
        media.load(&song(10.0));
        assert!(media.play().await.is_err());

        std::fs::write(dir.path().join("test.mp3"), b"").unwrap();
        assert!(media.play().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_advances_while_playing() {
        let mut media = ClockMedia::new();
        media.load(&song(60.0));
        media.play().await.unwrap();

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(media.current_time(), Duration::from_secs(3));

        media.pause();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(media.current_time(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ended_fires_once() {
        let mut media = ClockMedia::new();
        media.load(&song(2.0));
        media.play().await.unwrap();

        assert!(!media.take_ended());
        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(media.current_time(), Duration::from_secs(2));
        assert!(media.take_ended());
        assert!(!media.take_ended());
        assert!(media.is_paused());
    }

    #[tokio::test(start_paused = true)]
    async fn test_looping_wraps_without_ending() {
        let mut media = ClockMedia::new();
        media.load(&song(4.0));
        media.set_loop(true);
        media.play().await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(media.current_time(), Duration::from_secs(1));
        assert!(!media.take_ended());
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_after_end_restarts() {
        let mut media = ClockMedia::new();
        media.load(&song(2.0));
        media.play().await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(media.take_ended());

        media.play().await.unwrap();
        assert_eq!(media.current_time(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_clamped_to_duration() {
        let mut media = ClockMedia::new();
        media.load(&song(30.0));
        media.set_current_time(Duration::from_secs(12));
        assert_eq!(media.current_time(), Duration::from_secs(12));
        media.set_current_time(Duration::from_secs(99));
        assert_eq!(media.current_time(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_without_duration_is_capped() {
        let mut media = ClockMedia::new();
        media.load(&Song::new("Test", "test.mp3", "test.txt"));
        media.play().await.unwrap();

        media.set_current_time(Duration::MAX);
        assert_eq!(media.current_time(), MAX_UNBOUNDED_POSITION);

        tokio::time::advance(Duration::from_secs(3000)).await;
        assert_eq!(
            media.current_time(),
            MAX_UNBOUNDED_POSITION + Duration::from_secs(3000)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_saturates_instead_of_overflowing() {
        let mut media = ClockMedia::new();
        media.load(&Song::new("Test", "test.mp3", "test.txt"));
        media.anchor = Duration::MAX;
        media.play().await.unwrap();

        tokio::time::advance(Duration::from_secs(3000)).await;
        assert_eq!(media.current_time(), Duration::MAX);
    }

    #[test]
    fn test_volume_clamped() {
        let mut media = ClockMedia::new();
        media.set_volume(1.5);
        assert!((media.volume() - 1.0).abs() < f32::EPSILON);
        media.set_volume(-0.2);
        assert!(media.volume().abs() < f32::EPSILON);
    }
}
