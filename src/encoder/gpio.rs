use std::time::Duration;
use gpiocdev::line::{EdgeDetection, EdgeKind, Value};
use gpiocdev::Request;
use log::debug;

use crate::config::types::EncoderConfig;
use crate::encoder::decoder::EdgeSource;
use crate::encoder::types::{Edge, EdgeEvent, EdgeMode};
use crate::error::EncoderError;

impl From<EdgeMode> for EdgeDetection {
    fn from(mode: EdgeMode) -> Self {
        match mode {
            EdgeMode::Rising => EdgeDetection::RisingEdge,
            EdgeMode::Both => EdgeDetection::BothEdges,
        }
    }
}

impl From<EdgeKind> for Edge {
    fn from(kind: EdgeKind) -> Self {
        match kind {
            EdgeKind::Rising => Edge::Rising,
            EdgeKind::Falling => Edge::Falling,
        }
    }
}

/// Both encoder lines requested as inputs from the GPIO character device. Line A watches for
/// edges (debounced), line B is only ever sampled.
pub struct GpioEdgeSource {
    request: Request,
}

impl GpioEdgeSource {
    pub fn open(config: &EncoderConfig) -> Result<Self, EncoderError> {
        let request = Request::builder()
            .on_chip(&config.chip)
            .with_consumer(&config.consumer)
            .with_line(config.line_a)
            .as_input()
            .with_edge_detection(EdgeDetection::from(config.edges))
            .with_debounce_period(Duration::from_millis(config.debounce_ms))
            .with_line(config.line_b)
            .as_input()
            .request()
            .map_err(|source| EncoderError::HardwareAccessFailure {
                chip: config.chip.clone(),
                source,
            })?;

        debug!("Requested lines {} and {} as {}", config.line_a, config.line_b, config.consumer);
        Ok(GpioEdgeSource { request })
    }
}

impl EdgeSource for GpioEdgeSource {
    fn wait_edge_events(&mut self, timeout: Duration) -> Result<Vec<EdgeEvent>, EncoderError> {
        let mut events = Vec::new();

        if !self.request.wait_edge_event(timeout)? {
            return Ok(events);
        }

        loop {
            let event = self.request.read_edge_event()?;
            events.push(EdgeEvent { offset: event.offset, edge: event.kind.into() });

            if !self.request.has_edge_event()? {
                break;
            }
        }

        Ok(events)
    }

    fn is_active(&mut self, offset: u32) -> Result<bool, EncoderError> {
        Ok(self.request.value(offset)? == Value::Active)
    }
}
