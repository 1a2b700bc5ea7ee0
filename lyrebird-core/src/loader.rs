//! Loading the song manifest and lyric files from disk or over HTTP.

use crate::error::{CoreError, Result};
use crate::lrc::CueSheet;
use crate::manifest::{Song, SongManifest};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Default timeout for HTTP requests (10 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Source of text resources such as the manifest and lyric files
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// Load the resource at `location` as UTF-8 text
    async fn load_text(&self, location: &str) -> Result<String>;
}

/// Where a location points after resolving it against the loader's base
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLocation {
    Remote(Url),
    Local(PathBuf),
}

#[derive(Debug, Clone)]
enum Base {
    Dir(PathBuf),
    Url(Url),
}

/// Loads local files relative to a base directory and `http(s)` resources
/// relative to a base URL.
pub struct SourceLoader {
    client: reqwest::Client,
    base: Base,
}

impl SourceLoader {
    /// Create a loader that resolves relative paths against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base: Base::Dir(base_dir.into()),
        })
    }

    /// Create a loader whose base is the directory (or URL) holding the manifest,
    /// so lyric paths in the manifest resolve the way they were written.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn for_manifest(manifest_location: &str) -> Result<Self> {
        let base = match remote_url(manifest_location) {
            Some(url) => Base::Url(url),
            None => Base::Dir(
                Path::new(manifest_location)
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
            ),
        };

        Ok(Self {
            client: build_client()?,
            base,
        })
    }

    /// Resolve `location` against this loader's base
    ///
    /// # Errors
    ///
    /// Returns an error if a relative location cannot be joined onto a base URL.
    pub fn resolve(&self, location: &str) -> Result<ResolvedLocation> {
        if let Some(url) = remote_url(location) {
            return Ok(ResolvedLocation::Remote(url));
        }

        match &self.base {
            Base::Url(base) => base
                .join(location)
                .map(ResolvedLocation::Remote)
                .map_err(|_| CoreError::InvalidLocation {
                    location: location.to_string(),
                }),
            Base::Dir(dir) => {
                let path = Path::new(location);
                if path.is_absolute() {
                    Ok(ResolvedLocation::Local(path.to_path_buf()))
                } else {
                    Ok(ResolvedLocation::Local(dir.join(path)))
                }
            }
        }
    }

    async fn fetch_remote(&self, url: Url) -> Result<String> {
        debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(CoreError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl ResourceLoader for SourceLoader {
    async fn load_text(&self, location: &str) -> Result<String> {
        match self.resolve(location)? {
            ResolvedLocation::Remote(url) => self.fetch_remote(url).await,
            ResolvedLocation::Local(path) => {
                debug!("Reading {}", path.display());
                Ok(tokio::fs::read_to_string(&path).await?)
            }
        }
    }
}

fn build_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(5))
        .user_agent(concat!("Lyrebird/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Parse `location` as an absolute `http(s)` URL
fn remote_url(location: &str) -> Option<Url> {
    Url::parse(location)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

/// Load and parse the song manifest.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded or parsed, or if it lists no songs.
pub async fn load_manifest(loader: &dyn ResourceLoader, location: &str) -> Result<SongManifest> {
    let json = loader.load_text(location).await?;
    let manifest = SongManifest::from_json(&json)?;

    if manifest.is_empty() {
        return Err(CoreError::ManifestEmpty {
            location: location.to_string(),
        });
    }

    info!("Loaded {} songs from {}", manifest.len(), location);
    Ok(manifest)
}

/// Load and parse the lyrics for `song`.
///
/// # Errors
///
/// Returns [`CoreError::LyricsUnavailable`] if the lyric file cannot be loaded.
pub async fn load_lyrics(loader: &dyn ResourceLoader, song: &Song) -> Result<CueSheet> {
    let text = loader
        .load_text(&song.lyrics_file)
        .await
        .map_err(|e| CoreError::LyricsUnavailable {
            title: song.title.clone(),
            reason: e.to_string(),
        })?;

    let sheet = CueSheet::parse(&text);
    debug!("Parsed {} cues for {}", sheet.len(), song.title);
    Ok(sheet)
}
