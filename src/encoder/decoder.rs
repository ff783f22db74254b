use std::thread::{self, JoinHandle};
use std::time::Duration;
use log::{debug, error, info};
use tokio_util::sync::CancellationToken;

use crate::config::types::EncoderConfig;
use crate::dispatch::Dispatcher;
use crate::encoder::constants::EDGE_WAIT_TIMEOUT;
use crate::encoder::gpio::GpioEdgeSource;
use crate::encoder::types::{Direction, Edge, EdgeEvent, EncoderTick};
use crate::error::{readable_thread_panic_error, EncoderError};
use crate::events::PanelEvent;

/// Where edge events and line levels come from.
pub trait EdgeSource {
    /// Waits up to `timeout` and returns every edge that is pending. An empty batch means the
    /// wait timed out.
    fn wait_edge_events(&mut self, timeout: Duration) -> Result<Vec<EdgeEvent>, EncoderError>;

    fn is_active(&mut self, offset: u32) -> Result<bool, EncoderError>;
}

/// On a rising edge of A, an active B means clockwise. A falling edge inverts the relation, so
/// in both cases clockwise means B already sits at A's new level.
pub fn decode_direction(edge: Edge, b_active: bool) -> Direction {
    let clockwise = match edge {
        Edge::Rising => b_active,
        Edge::Falling => !b_active,
    };

    match clockwise {
        true => Direction::Clockwise,
        false => Direction::CounterClockwise,
    }
}

/// Posts one tick for every edge on `line_a` until `cancel` fires. B is sampled once per edge,
/// which is only reliable while the debounce period is shorter than a detent.
pub fn run_decoder<S: EdgeSource>(
    source: &mut S,
    line_a: u32,
    line_b: u32,
    dispatcher: &Dispatcher<PanelEvent>,
    cancel: &CancellationToken,
) -> Result<(), EncoderError> {
    let timeout = Duration::from_millis(EDGE_WAIT_TIMEOUT);

    while !cancel.is_cancelled() {
        for event in source.wait_edge_events(timeout)? {
            if event.offset != line_a {
                continue;
            }

            let b_active = source.is_active(line_b)?;
            let direction = decode_direction(event.edge, b_active);
            debug!("Encoder tick {:?}", direction);

            if !dispatcher.post(PanelEvent::Encoder(EncoderTick { direction })) {
                debug!("Nobody listens to encoder ticks anymore");
                return Ok(());
            }
        }
    }

    Ok(())
}

/// Requests the encoder lines and decodes them on a dedicated thread. Failing to access the
/// hardware ends the thread; there is no retry.
pub struct RotaryEncoder {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl RotaryEncoder {
    pub fn start(
        config: EncoderConfig,
        dispatcher: Dispatcher<PanelEvent>,
        cancel: CancellationToken,
    ) -> std::io::Result<Self> {
        let cancel = cancel.child_token();
        let thread_cancel = cancel.clone();

        let handle = thread::Builder::new()
            .name("rotary-encoder".to_string())
            .spawn(move || {
                let result = GpioEdgeSource::open(&config).and_then(|mut source| {
                    info!("Watching encoder lines {}/{} on {}", config.line_a, config.line_b, config.chip);
                    run_decoder(&mut source, config.line_a, config.line_b, &dispatcher, &thread_cancel)
                });

                match result {
                    Ok(()) => info!("Rotary encoder stopped"),
                    Err(err) => error!("{}; rotary encoder stays disabled", err),
                }
            })?;

        Ok(RotaryEncoder { cancel, handle: Some(handle) })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|handle| !handle.is_finished()).unwrap_or(false)
    }

    /// Waits at most one edge wait timeout.
    pub fn stop(&mut self) {
        self.cancel.cancel();

        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.join() {
                error!("Failed to join rotary encoder: {}", readable_thread_panic_error(&err));
            }
        }
    }
}

impl Drop for RotaryEncoder {
    fn drop(&mut self) {
        self.stop();
    }
}
