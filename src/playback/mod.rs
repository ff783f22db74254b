pub mod constants;
pub mod controller;
#[cfg(feature = "gstreamer")]
pub mod gst;
pub mod pipeline;
pub mod playlist;
pub mod types;

use tokio_util::sync::CancellationToken;
use crate::dispatch::Dispatcher;
use crate::events::PanelEvent;
use crate::playback::pipeline::MediaPipeline;

/// Creates the playbin backed pipeline, or a disabled one when it can not be built.
#[cfg(feature = "gstreamer")]
pub fn default_pipeline(dispatcher: Dispatcher<PanelEvent>, cancel: CancellationToken) -> Box<dyn MediaPipeline> {
    match gst::GstPipeline::new(dispatcher, cancel) {
        Ok(pipeline) => Box::new(pipeline),
        Err(err) => {
            log::error!("Failed to create media pipeline: {}", err);
            Box::new(pipeline::DisabledPipeline)
        },
    }
}

#[cfg(not(feature = "gstreamer"))]
pub fn default_pipeline(_dispatcher: Dispatcher<PanelEvent>, _cancel: CancellationToken) -> Box<dyn MediaPipeline> {
    log::warn!("Built without the gstreamer feature, stream playback is disabled");
    Box::new(pipeline::DisabledPipeline)
}
