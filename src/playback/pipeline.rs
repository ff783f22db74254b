use log::debug;

use crate::error::PlaybackError;
use crate::playback::types::BufferSettings;

/// States of the media pipeline itself, as opposed to [`crate::playback::types::PlaybackState`]
/// which is what the panel reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Null,
    Ready,
    Paused,
    Playing,
}

impl PipelineState {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Null => "NULL",
            PipelineState::Ready => "READY",
            PipelineState::Paused => "PAUSED",
            PipelineState::Playing => "PLAYING",
        }
    }
}

/// A message taken from the pipeline's own bus.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineMessage {
    Error {
        message: String,
        debug: Option<String>,
    },
    StateChanged {
        // false for transitions of the pipeline's child elements
        top_level: bool,
        old: PipelineState,
        new: PipelineState,
    },
    Buffering(i32),
    Tag {
        title: Option<String>,
        artist: Option<String>,
    },
    EndOfStream,
}

/// A bus message stamped with the pipeline generation it was taken off the bus in. Messages
/// already in flight when the pipeline is reset carry an older generation.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineEvent {
    pub generation: u64,
    pub message: PipelineMessage,
}

pub trait MediaPipeline {
    /// Requests a state transition. An error means the pipeline rejected the request outright;
    /// asynchronous transitions report their outcome through the bus.
    fn set_state(&mut self, state: PipelineState) -> Result<(), PlaybackError>;

    fn set_uri(&mut self, uri: &str);

    fn set_buffering(&mut self, settings: &BufferSettings);

    fn set_volume(&mut self, volume: f64);

    /// Advances every time the pipeline is brought down to NULL.
    fn generation(&self) -> u64 {
        0
    }
}

impl<P: MediaPipeline + ?Sized> MediaPipeline for Box<P> {
    fn set_state(&mut self, state: PipelineState) -> Result<(), PlaybackError> {
        (**self).set_state(state)
    }

    fn set_uri(&mut self, uri: &str) {
        (**self).set_uri(uri)
    }

    fn set_buffering(&mut self, settings: &BufferSettings) {
        (**self).set_buffering(settings)
    }

    fn set_volume(&mut self, volume: f64) {
        (**self).set_volume(volume)
    }

    fn generation(&self) -> u64 {
        (**self).generation()
    }
}

/// Stands in when no media backend is available. It accepts configuration but refuses to play.
#[derive(Debug, Default)]
pub struct DisabledPipeline;

impl MediaPipeline for DisabledPipeline {
    fn set_state(&mut self, state: PipelineState) -> Result<(), PlaybackError> {
        match state {
            PipelineState::Null => Ok(()),
            _ => Err(PlaybackError::PipelineStateFailure {
                target: state.name(),
                reason: "no media backend available".to_string(),
            }),
        }
    }

    fn set_uri(&mut self, uri: &str) {
        debug!("Ignoring uri {} (playback disabled)", uri);
    }

    fn set_buffering(&mut self, _settings: &BufferSettings) {}

    fn set_volume(&mut self, _volume: f64) {}
}
