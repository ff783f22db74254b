use crate::playback::constants::STREAM_RUNNING_PLACEHOLDER;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
    Buffering,
    Error,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let result = match self {
            PlaybackState::Idle => "Idle",
            PlaybackState::Loading => "Loading",
            PlaybackState::Playing => "Playing",
            PlaybackState::Buffering => "Buffering",
            PlaybackState::Error => "Error",
        };

        write!(f, "{}", result)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackMetadata {
    pub artist: Option<String>,
    pub title: Option<String>,
}

impl TrackMetadata {
    pub fn is_empty(&self) -> bool {
        self.artist.is_none() && self.title.is_none()
    }

    /// `"artist - title"`, or whichever of the two is known.
    pub fn display(&self) -> String {
        match (&self.artist, &self.title) {
            (Some(artist), Some(title)) => format!("{} - {}", artist, title),
            (Some(artist), None) => artist.clone(),
            (None, Some(title)) => title.clone(),
            (None, None) => STREAM_RUNNING_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSettings {
    pub duration_ms: u64,
    pub size_bytes: u32,
}
