use crate::display::{LyricView, LyricsDisplay};
use crate::error::{CoreError, Result};
use crate::loader::{load_lyrics, ResourceLoader};
use crate::lrc::CueSheet;
use crate::manifest::SongManifest;
use crate::media::MediaElement;
use crate::player::{volume_from_percent, LyricsApply, PlayPause, PlayerState, SongTicket};
use crate::sync::{DisplayWindow, LyricWindowResolver};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Events emitted by the player
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// A song was selected and its playback started
    SongStarted { index: usize, title: String },
    /// Playback was paused
    PlaybackPaused { position: Duration },
    /// Playback was resumed
    PlaybackResumed { position: Duration },
    /// The media element refused to play
    PlaybackRejected { index: Option<usize>, reason: String },
    /// The current song reached its end
    TrackEnded { index: usize },
    LoopToggled { enabled: bool },
    VolumeChanged { volume: f32 },
    Seeked { position: Duration },
    /// Lyrics were loaded for the current song
    LyricsLoaded { index: usize, lines: usize },
    /// Lyrics could not be loaded for the current song
    LyricsNotFound { index: usize, reason: String },
    /// Lyrics arrived for a song that is no longer selected
    StaleLyricsDiscarded { index: usize },
    /// Regular time update
    Progress {
        position: Duration,
        duration: Option<Duration>,
    },
}

/// Result of a lyrics fetch, tagged with the selection it was made for
#[derive(Debug)]
pub struct LyricsDelivery {
    pub ticket: SongTicket,
    pub result: Result<CueSheet>,
}

/// Drives a media element from the player state and renders lyrics.
///
/// All mutation goes through `&mut self`; the owner is expected to call into
/// the player from a single event loop. Lyrics fetches are handed out as
/// futures so the loop stays responsive while they run.
pub struct Player<M: MediaElement> {
    state: PlayerState,
    media: M,
    manifest: Arc<SongManifest>,
    loader: Arc<dyn ResourceLoader>,
    view: LyricView,
    event_tx: broadcast::Sender<PlayerEvent>,
}

impl<M: MediaElement> Player<M> {
    #[must_use]
    pub fn new(
        media: M,
        manifest: SongManifest,
        loader: Arc<dyn ResourceLoader>,
        resolver: LyricWindowResolver,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(64);

        Self {
            state: PlayerState::new(),
            media,
            manifest: Arc::new(manifest),
            loader,
            view: LyricView::new(resolver),
            event_tx,
        }
    }

    /// Subscribe to player events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.event_tx.subscribe()
    }

    #[must_use]
    pub const fn state(&self) -> &PlayerState {
        &self.state
    }

    #[must_use]
    pub fn manifest(&self) -> &SongManifest {
        &self.manifest
    }

    #[must_use]
    pub const fn media(&self) -> &M {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    fn emit(&self, event: PlayerEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    /// Select song `index` and start playing it.
    ///
    /// Returns the ticket to fetch lyrics with once playback has started, or
    /// `None` if the media element refused to play. A refusal is logged and
    /// leaves the player stopped.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SongOutOfRange`] if `index` is not in the manifest.
    pub async fn play_song(&mut self, index: usize) -> Result<Option<SongTicket>> {
        let (state, ticket) = self.state.clone().select_song(index, self.manifest.len())?;
        self.state = state;

        let manifest = Arc::clone(&self.manifest);
        let Some(song) = manifest.get(index) else {
            return Err(CoreError::SongOutOfRange {
                index,
                len: manifest.len(),
            });
        };

        self.media.load(song);
        match self.media.play().await {
            Ok(()) => {
                self.state = self.state.clone().playback_started(ticket);
                info!("Playing {} ({})", song.title, song.file);
                self.emit(PlayerEvent::SongStarted {
                    index,
                    title: song.title.clone(),
                });
                Ok(Some(ticket))
            }
            Err(e) => {
                warn!("Playback was prevented: {}", e);
                self.state = self.state.clone().playback_rejected();
                self.emit(PlayerEvent::PlaybackRejected {
                    index: Some(index),
                    reason: e.to_string(),
                });
                Ok(None)
            }
        }
    }

    /// Play the song after the current one, wrapping to the first
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest is empty.
    pub async fn next_song(&mut self) -> Result<Option<SongTicket>> {
        let next = self
            .manifest
            .next_index(self.state.current_song())
            .ok_or(CoreError::SongOutOfRange { index: 0, len: 0 })?;
        self.play_song(next).await
    }

    /// Pause, resume, or start the first song when nothing was selected yet.
    ///
    /// Returns a lyrics ticket only when a new song was started.
    ///
    /// # Errors
    ///
    /// Returns an error if a first song had to be started and the manifest is empty.
    pub async fn toggle_play_pause(&mut self) -> Result<Option<SongTicket>> {
        let (state, action) = self.state.clone().toggle_play_pause();
        self.state = state;

        match action {
            PlayPause::Pause => {
                self.media.pause();
                self.emit(PlayerEvent::PlaybackPaused {
                    position: self.media.current_time(),
                });
                Ok(None)
            }
            PlayPause::Resume => {
                if let Err(e) = self.media.play().await {
                    warn!("Playback was prevented: {}", e);
                    self.state = self.state.clone().playback_rejected();
                    self.emit(PlayerEvent::PlaybackRejected {
                        index: self.state.current_song(),
                        reason: e.to_string(),
                    });
                } else {
                    self.emit(PlayerEvent::PlaybackResumed {
                        position: self.media.current_time(),
                    });
                }
                Ok(None)
            }
            PlayPause::StartFirstSong => self.play_song(0).await,
        }
    }

    /// Flip single-song looping; returns the new setting
    pub fn toggle_loop(&mut self) -> bool {
        self.state = self.state.clone().toggle_loop();
        let enabled = self.state.is_looping();
        self.media.set_loop(enabled);
        self.emit(PlayerEvent::LoopToggled { enabled });
        enabled
    }

    /// Set the volume from a 0-100 slider value; returns the media volume
    pub fn set_volume(&mut self, percent: u8) -> f32 {
        let volume = volume_from_percent(percent);
        self.media.set_volume(volume);
        self.emit(PlayerEvent::VolumeChanged { volume });
        volume
    }

    /// Move the playback position
    pub fn seek(&mut self, position: Duration) {
        self.media.set_current_time(position);
        self.emit(PlayerEvent::Seeked {
            position: self.media.current_time(),
        });
    }

    /// Handle the media element reaching the end of the song.
    ///
    /// Advances to the next song unless looping.
    ///
    /// # Errors
    ///
    /// Returns an error if the next song cannot be selected.
    pub async fn on_ended(&mut self) -> Result<Option<SongTicket>> {
        if let Some(index) = self.state.current_song() {
            self.emit(PlayerEvent::TrackEnded { index });
        }

        match self.state.track_ended(self.manifest.len()) {
            Some(next) => self.play_song(next).await,
            None => Ok(None),
        }
    }

    /// Handle a time update: render the lyric window for the current position.
    ///
    /// Safe to call at any rate; repeated calls at the same position render
    /// the same window.
    pub fn on_time_update<D: LyricsDisplay + ?Sized>(
        &self,
        display: &mut D,
    ) -> Option<DisplayWindow> {
        let position = self.media.current_time();
        self.emit(PlayerEvent::Progress {
            position,
            duration: self.media.duration(),
        });
        self.view.render(display, self.state.lyrics(), position)
    }

    /// Fetch lyrics for `ticket` without borrowing the player.
    ///
    /// The returned future can be spawned; feed its output to
    /// [`Player::apply_lyrics`].
    pub fn fetch_lyrics(
        &self,
        ticket: SongTicket,
    ) -> impl Future<Output = LyricsDelivery> + Send + 'static {
        let loader = Arc::clone(&self.loader);
        let manifest = Arc::clone(&self.manifest);

        async move {
            let result = match manifest.get(ticket.song_index) {
                Some(song) => load_lyrics(loader.as_ref(), song).await,
                None => Err(CoreError::SongOutOfRange {
                    index: ticket.song_index,
                    len: manifest.len(),
                }),
            };
            LyricsDelivery { ticket, result }
        }
    }

    /// Apply a finished lyrics fetch. Deliveries for a song that is no
    /// longer selected are discarded.
    pub fn apply_lyrics(&mut self, delivery: LyricsDelivery) -> LyricsApply {
        let LyricsDelivery { ticket, result } = delivery;
        let index = ticket.song_index;

        let (state, outcome) = match result {
            Ok(sheet) => {
                let lines = sheet.len();
                let (state, outcome) = self.state.clone().lyrics_loaded(ticket, sheet);
                if outcome == LyricsApply::Applied {
                    info!("Lyrics loaded: {} lines", lines);
                    self.emit(PlayerEvent::LyricsLoaded { index, lines });
                }
                (state, outcome)
            }
            Err(e) => {
                let (state, outcome) = self.state.clone().lyrics_failed(ticket);
                if outcome == LyricsApply::Failed {
                    warn!("Error loading the lyrics: {}", e);
                    self.emit(PlayerEvent::LyricsNotFound {
                        index,
                        reason: e.to_string(),
                    });
                }
                (state, outcome)
            }
        };

        if outcome == LyricsApply::Stale {
            debug!("Discarding lyrics for song {} (no longer selected)", index);
            self.emit(PlayerEvent::StaleLyricsDiscarded { index });
        }

        self.state = state;
        outcome
    }

    /// Fetch and apply lyrics in one step
    pub async fn load_lyrics(&mut self, ticket: SongTicket) -> LyricsApply {
        let delivery = self.fetch_lyrics(ticket).await;
        self.apply_lyrics(delivery)
    }
}
