use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use gstreamer as gst;
use gst::prelude::*;
use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::dispatch::Dispatcher;
use crate::error::PlaybackError;
use crate::events::PanelEvent;
use crate::playback::pipeline::{MediaPipeline, PipelineEvent, PipelineMessage, PipelineState};
use crate::playback::types::BufferSettings;

/**
 * How long (milliseconds) the bus thread waits for a message before checking for cancellation.
 */
const BUS_POLL_DELAY: u64 = 100;

impl From<gst::State> for PipelineState {
    fn from(state: gst::State) -> Self {
        match state {
            gst::State::Playing => PipelineState::Playing,
            gst::State::Paused => PipelineState::Paused,
            gst::State::Ready => PipelineState::Ready,
            _ => PipelineState::Null,
        }
    }
}

impl From<PipelineState> for gst::State {
    fn from(state: PipelineState) -> Self {
        match state {
            PipelineState::Playing => gst::State::Playing,
            PipelineState::Paused => gst::State::Paused,
            PipelineState::Ready => gst::State::Ready,
            PipelineState::Null => gst::State::Null,
        }
    }
}

fn convert_message(message: &gst::Message, playbin: &gst::Element) -> Option<PipelineMessage> {
    use gst::MessageView;

    match message.view() {
        MessageView::Error(err) => Some(PipelineMessage::Error {
            message: err.error().to_string(),
            debug: err.debug().map(|debug| debug.to_string()),
        }),
        MessageView::StateChanged(changed) => {
            let top_level = message
                .src()
                .map(|src| src == playbin.upcast_ref::<gst::Object>())
                .unwrap_or(false);

            Some(PipelineMessage::StateChanged {
                top_level,
                old: changed.old().into(),
                new: changed.current().into(),
            })
        },
        MessageView::Buffering(buffering) => Some(PipelineMessage::Buffering(buffering.percent())),
        MessageView::Tag(tag) => {
            let tags = tag.tags();
            let title = tags.get::<gst::tags::Title>().map(|value| value.get().to_string());
            let artist = tags.get::<gst::tags::Artist>().map(|value| value.get().to_string());
            Some(PipelineMessage::Tag { title, artist })
        },
        MessageView::Eos(_) => Some(PipelineMessage::EndOfStream),
        _ => None,
    }
}

fn bus_thread(
    cancel: CancellationToken,
    bus: gst::Bus,
    playbin: gst::Element,
    generation: Arc<AtomicU64>,
    dispatcher: Dispatcher<PanelEvent>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("gst-bus".to_string())
        .spawn(move || {
            while !cancel.is_cancelled() {
                let message = match bus.timed_pop(gst::ClockTime::from_mseconds(BUS_POLL_DELAY)) {
                    None => continue,
                    Some(message) => message,
                };

                if let Some(message) = convert_message(&message, &playbin) {
                    let generation = generation.load(Ordering::SeqCst);
                    if !dispatcher.post(PanelEvent::Pipeline(PipelineEvent { generation, message })) {
                        break;
                    }
                }
            }
            debug!("Pipeline bus thread stopped");
        })
}

/// A `playbin` element. Its bus is drained on a dedicated thread and every message is posted
/// through the dispatcher.
pub struct GstPipeline {
    playbin: gst::Element,
    bus_thread: Option<JoinHandle<()>>,
    generation: Arc<AtomicU64>,
    cancel: CancellationToken,
}

impl GstPipeline {
    pub fn new(dispatcher: Dispatcher<PanelEvent>, cancel: CancellationToken) -> Result<Self, PlaybackError> {
        let failure = |target: &'static str| move |err: gst::glib::Error| PlaybackError::PipelineStateFailure {
            target,
            reason: err.to_string(),
        };

        gst::init().map_err(failure("init"))?;

        let playbin = gst::ElementFactory::make("playbin")
            .name("radio-player")
            .build()
            .map_err(|err| PlaybackError::PipelineStateFailure {
                target: "create",
                reason: err.to_string(),
            })?;

        let bus = playbin.bus().ok_or_else(|| PlaybackError::PipelineStateFailure {
            target: "create",
            reason: "playbin has no bus".to_string(),
        })?;

        let cancel = cancel.child_token();
        let generation = Arc::new(AtomicU64::new(0));
        let handle = bus_thread(cancel.clone(), bus, playbin.clone(), generation.clone(), dispatcher)
            .map_err(|err| PlaybackError::PipelineStateFailure {
                target: "create",
                reason: err.to_string(),
            })?;

        Ok(GstPipeline { playbin, bus_thread: Some(handle), generation, cancel })
    }
}

impl MediaPipeline for GstPipeline {
    fn set_state(&mut self, state: PipelineState) -> Result<(), PlaybackError> {
        self.playbin
            .set_state(state.into())
            .map_err(|err| PlaybackError::PipelineStateFailure {
                target: state.name(),
                reason: err.to_string(),
            })?;

        // going to NULL flushes the bus, only messages already taken off it can be stale
        if state == PipelineState::Null {
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn set_uri(&mut self, uri: &str) {
        self.playbin.set_property("uri", uri);
    }

    fn set_buffering(&mut self, settings: &BufferSettings) {
        // buffer-duration is in nanoseconds
        let duration_ns = i64::try_from(settings.duration_ms.saturating_mul(1_000_000)).unwrap_or(i64::MAX);
        let size = i32::try_from(settings.size_bytes).unwrap_or(i32::MAX);
        self.playbin.set_property("buffer-duration", duration_ns);
        self.playbin.set_property("buffer-size", size);
    }

    fn set_volume(&mut self, volume: f64) {
        self.playbin.set_property("volume", volume);
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl Drop for GstPipeline {
    fn drop(&mut self) {
        if let Err(err) = self.playbin.set_state(gst::State::Null) {
            warn!("Failed to shut down pipeline: {}", err);
        }

        self.cancel.cancel();
        if let Some(handle) = self.bus_thread.take() {
            if handle.join().is_err() {
                warn!("Pipeline bus thread panicked");
            }
        }
    }
}
