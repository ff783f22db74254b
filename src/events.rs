use crate::discovery::types::DiscoveredDevice;
use crate::encoder::types::EncoderTick;
use crate::playback::pipeline::PipelineEvent;
use crate::playback::types::{PlaybackState, TrackMetadata};

/// Everything a peripheral can hand to the UI through the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    DeviceDiscovered(DiscoveredDevice),
    PairingFinished { address: String, success: bool },
    Track(TrackMetadata),
    PlaybackState(PlaybackState),
    Buffering(i32),
    // raw pipeline bus traffic, interpreted by the playback controller on the UI thread
    Pipeline(PipelineEvent),
    Encoder(EncoderTick),
}
