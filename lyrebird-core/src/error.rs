use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}. A template has been created with default settings.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Library errors
    #[error("Failed to parse song manifest: {0}")]
    ManifestParseError(#[from] serde_json::Error),

    #[error("Song manifest at {location} contains no songs")]
    ManifestEmpty { location: String },

    #[error("Song index {index} is out of range (library has {len} songs)")]
    SongOutOfRange { index: usize, len: usize },

    // Resource errors
    #[error("Invalid resource location: {location}")]
    InvalidLocation { location: String },

    #[error("Request for {url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Lyrics not available for {title}: {reason}")]
    LyricsUnavailable { title: String, reason: String },

    // Playback errors
    #[error("Playback was prevented: {reason}")]
    PlaybackRejected { reason: String },

    // Network errors
    #[error("Network request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
