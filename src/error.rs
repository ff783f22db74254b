use std::any::Any;
use std::io;
use std::str::Utf8Error;
use thiserror::Error;
use iced;
use serde_json;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine path to config file")]
    NoConfigPath,

    #[error("Failed to acquire file lock on config file: {source}")]
    CanNotLock { source: io::Error },

    #[error("Failed to encode/decode config as utf-8: {source}")]
    Utf8Error { #[from] source: Utf8Error },

    #[error("Failed to read/write config file: {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to parse/build config file: {source}")]
    JsonError { #[from] source: serde_json::Error },
}

impl ConfigError {
    pub fn is_file_not_found_error(&self) -> bool {
        match self {
            ConfigError::IOError { source } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppRunError {
    #[error("Failed to start application (iced): {source}")]
    Iced { #[from] source: iced::Error },

    #[error("Failed to start application (config): {source}")]
    ConfigError { #[from] source: ConfigError },
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("System bus is not available (zbus): {source}")]
    TransportUnavailable { #[from] source: zbus::Error },

    #[error("Remote call {method} on {path} failed: {source}")]
    RemoteCallFailed {
        method: &'static str,
        path: String,
        source: zbus::Error,
    },
}

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Pipeline rejected the transition to {target}: {reason}")]
    PipelineStateFailure { target: &'static str, reason: String },

    #[error("Pipeline reported an error: {message}")]
    PipelineFailure { message: String, debug: Option<String> },

    #[error("Failed to fetch playlist (reqwest): {source}")]
    PlaylistResolutionFailure { #[from] source: reqwest::Error },

    #[error("Playlist did not contain a stream entry")]
    EmptyPlaylist,
}

#[derive(Error, Debug)]
pub enum PositionError {
    #[error("gpsd is not reachable at {address}: {source}")]
    PositionSourceUnavailable { address: String, source: io::Error },

    #[error("Failed to talk to gpsd: {source}")]
    IOError { #[from] source: io::Error },
}

#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("Failed to access GPIO lines on {chip} (gpiocdev): {source}")]
    HardwareAccessFailure { chip: String, source: gpiocdev::Error },

    #[error("Failed to read GPIO line (gpiocdev): {source}")]
    Gpio { #[from] source: gpiocdev::Error },
}

pub fn readable_thread_panic_error(error: &Box<dyn Any + Send + 'static>) -> String {
    let mut stringified = String::from("???");

    if let Some(s) = error.downcast_ref::<&str>() {
        stringified = format!("{}", s);
    }
    else if let Some(s) = error.downcast_ref::<String>() {
        stringified = format!("{}", s);
    }
    let type_id = (**error).type_id();

    format!("panic from thread: [{:?}]: [{}]", type_id, stringified)
}
