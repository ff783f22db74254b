use std::time::Duration;
use log::{debug, info, warn};
use reqwest::{Client, Url};

use crate::error::PlaybackError;
use crate::playback::constants::{PLAYLIST_FETCH_TIMEOUT, PLAYLIST_USER_AGENT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistKind {
    M3u,
    Pls,
}

/// Detects playlist references by the suffix of the uri's path; the query string is ignored.
/// `.m3u8` is left alone because that is an HLS manifest which the pipeline plays directly.
pub fn playlist_kind(uri: &str) -> Option<PlaylistKind> {
    let url = Url::parse(uri).ok()?;
    let path = url.path().to_ascii_lowercase();

    if path.ends_with(".m3u") {
        Some(PlaylistKind::M3u)
    }
    else if path.ends_with(".pls") {
        Some(PlaylistKind::Pls)
    }
    else {
        None
    }
}

/// First line that is neither blank nor a `#` comment.
pub fn parse_m3u(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}

/// Value of the first `FileN=` entry.
pub fn parse_pls(content: &str) -> Option<String> {
    content
        .lines()
        .filter_map(|line| line.trim().split_once('='))
        .find(|(key, _)| {
            let key = key.trim().to_ascii_lowercase();
            match key.strip_prefix("file") {
                Some(index) => !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()),
                None => false,
            }
        })
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn parse_playlist(kind: PlaylistKind, content: &str) -> Option<String> {
    match kind {
        PlaylistKind::M3u => parse_m3u(content),
        PlaylistKind::Pls => parse_pls(content),
    }
}

/// Turns playlist references into the stream they point to.
#[derive(Debug, Clone)]
pub struct PlaylistResolver {
    client: Client,
}

impl Default for PlaylistResolver {
    fn default() -> Self {
        PlaylistResolver::new()
    }
}

impl PlaylistResolver {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(PLAYLIST_USER_AGENT)
            .timeout(Duration::from_secs(PLAYLIST_FETCH_TIMEOUT))
            .build()
            .unwrap_or_default();

        PlaylistResolver { client }
    }

    async fn fetch(&self, uri: &str, kind: PlaylistKind) -> Result<String, PlaybackError> {
        let content = self.client
            .get(uri)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_playlist(kind, &content).ok_or(PlaybackError::EmptyPlaylist)
    }

    /// Returns the stream uri a playlist reference points to. Uris that are not playlist
    /// references are returned as they are, and so is the original uri if the playlist can not
    /// be fetched or has no entry.
    pub async fn resolve(&self, uri: &str) -> String {
        let kind = match playlist_kind(uri) {
            None => return uri.to_string(),
            Some(kind) => kind,
        };

        debug!("Playlist ({:?}) detected, extracting stream uri from {}", kind, uri);

        match self.fetch(uri, kind).await {
            Ok(resolved) => {
                info!("Playlist {} points to {}", uri, resolved);
                resolved
            },
            Err(err) => {
                warn!("Could not resolve playlist {}, using it as is: {}", uri, err);
                uri.to_string()
            },
        }
    }
}
