pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod loader;
pub mod lrc;
pub mod manifest;
pub mod media;
pub mod paths;
pub mod player;
pub mod sync;
pub mod time;

pub use config::{
    DisplayConfig, HighlightColor, LibraryConfig, LoggingConfig, LyrebirdConfig, LyricsConfig,
    PlaybackConfig,
};
pub use controller::{LyricsDelivery, Player, PlayerEvent};
pub use display::{
    centered_scroll_top, DisplayLine, LineGeometry, LyricView, LyricsDisplay, Viewport,
};
pub use error::CoreError;
pub use loader::{load_lyrics, load_manifest, ResolvedLocation, ResourceLoader, SourceLoader};
pub use lrc::{Cue, CueSheet};
pub use manifest::{Song, SongManifest};
pub use media::{ClockMedia, MediaElement, MAX_UNBOUNDED_POSITION};
pub use paths::{config_dir, config_path, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use player::{volume_from_percent, LyricsApply, PlayPause, PlayerState, SongTicket};
pub use sync::{DisplayWindow, LyricWindowResolver, LOOKAHEAD_OFFSET};
pub use time::{progress_label, DurationExt};
