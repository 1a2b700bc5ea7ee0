use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One entry of the song manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub title: String,
    /// Audio file path or URL
    pub file: String,
    /// Time-tagged lyrics path or URL
    pub lyrics_file: String,
    /// Track length in seconds, used when nothing can report it from the audio itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl Song {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        file: impl Into<String>,
        lyrics_file: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            file: file.into(),
            lyrics_file: lyrics_file.into(),
            duration: None,
        }
    }

    #[must_use]
    pub const fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Track length, if the manifest declares a usable one
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.duration
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}

/// Ordered list of songs, as loaded from `songs.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongManifest {
    songs: Vec<Song>,
}

impl SongManifest {
    #[must_use]
    pub const fn new(songs: Vec<Song>) -> Self {
        Self { songs }
    }

    /// Parse a manifest from its JSON form (an array of song records)
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a record is missing a field.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Song> {
        self.songs.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Song that follows `current`, wrapping to the first after the last.
    ///
    /// With nothing selected yet the first song is next.
    #[must_use]
    pub fn next_index(&self, current: Option<usize>) -> Option<usize> {
        if self.songs.is_empty() {
            return None;
        }

        let next = current.map_or(0, |i| i + 1);
        Some(if next >= self.songs.len() { 0 } else { next })
    }
}
