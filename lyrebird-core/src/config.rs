use crate::error::{CoreError, Result};
use crate::sync::LyricWindowResolver;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyrebirdConfig {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub lyrics: LyricsConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Path or URL of the song manifest
    #[serde(default = "default_manifest")]
    pub manifest: String,
}

fn default_manifest() -> String {
    "songs.json".to_string()
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricsConfig {
    /// How far ahead of the playback position lines are highlighted
    #[serde(default = "default_lookahead_ms")]
    pub lookahead_ms: u64,
}

const fn default_lookahead_ms() -> u64 {
    500
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            lookahead_ms: default_lookahead_ms(),
        }
    }
}

impl LyricsConfig {
    #[must_use]
    pub const fn resolver(&self) -> LyricWindowResolver {
        LyricWindowResolver::new(Duration::from_millis(self.lookahead_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Initial volume, 0-100
    #[serde(default = "default_volume")]
    pub volume: u8,
    /// Interval between time updates
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Refuse to play songs whose local audio file is missing
    #[serde(default = "default_true")]
    pub require_audio_files: bool,
}

const fn default_volume() -> u8 {
    100
}

const fn default_tick_interval() -> u64 {
    250
}

const fn default_true() -> bool {
    true
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            tick_interval_ms: default_tick_interval(),
            require_audio_files: default_true(),
        }
    }
}

impl PlaybackConfig {
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Height of the lyrics viewport in terminal rows
    #[serde(default = "default_viewport_rows")]
    pub viewport_rows: u16,
    #[serde(default = "default_highlight_color")]
    pub highlight_color: HighlightColor,
}

const fn default_viewport_rows() -> u16 {
    5
}

const fn default_highlight_color() -> HighlightColor {
    HighlightColor::Cyan
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            viewport_rows: default_viewport_rows(),
            highlight_color: default_highlight_color(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HighlightColor {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    #[default]
    Cyan,
    White,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to a file in the cache directory
    #[serde(default)]
    pub enabled: bool,
}

impl LyrebirdConfig {
    /// Get the configuration directory path (~/.config/lyrebird/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/lyrebird/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default location or create a template on first run
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing the template, or an
    /// error if the config file cannot be read, parsed or validated.
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_at(&Self::config_path())
    }

    /// Load config from `config_path`, writing the template there if it is missing
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing the template, or an
    /// error if the config file cannot be read, parsed or validated.
    pub fn load_or_create_at(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(config_path, CONFIG_TEMPLATE)?;

            return Err(CoreError::ConfigNotFound {
                path: config_path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(config_path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a config from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value is out of range.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.library.manifest.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "library.manifest must not be empty".to_string(),
            });
        }
        if self.playback.volume > 100 {
            return Err(CoreError::ConfigInvalid {
                message: format!("playback.volume must be 0-100, got {}", self.playback.volume),
            });
        }
        if self.playback.tick_interval_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "playback.tick_interval_ms must be greater than 0".to_string(),
            });
        }
        if self.display.viewport_rows < 3 {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "display.viewport_rows must be at least 3, got {}",
                    self.display.viewport_rows
                ),
            });
        }
        Ok(())
    }
}

const CONFIG_TEMPLATE: &str = r#"# Lyrebird Configuration
# ~/.config/lyrebird/config.toml

[library]
# Song manifest: a JSON array of { "title", "file", "lyricsFile" } records.
# May be a local path or an http(s) URL. Relative song and lyric paths are
# resolved against the manifest's location.
manifest = "songs.json"

[lyrics]
# Highlight lines this many milliseconds before their timestamp
lookahead_ms = 500

[playback]
volume = 100          # 0-100
tick_interval_ms = 250
# Refuse to play entries whose local audio file does not exist
require_audio_files = true

[display]
viewport_rows = 5     # at least 3
# "red", "green", "yellow", "blue", "magenta", "cyan", "white"
highlight_color = "cyan"

[logging]
# Also write logs to the cache directory
enabled = false
"#;
