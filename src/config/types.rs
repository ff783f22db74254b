use serde::{Deserialize, Serialize};

use crate::discovery::constants::DEFAULT_ADAPTER;
use crate::encoder::constants::{DEFAULT_CHIP, DEFAULT_CONSUMER, DEFAULT_DEBOUNCE_MS, DEFAULT_LINE_A, DEFAULT_LINE_B};
use crate::encoder::types::EdgeMode;
use crate::playback::constants::{BUFFER_DURATION_MS, BUFFER_SIZE_BYTES};
use crate::playback::types::BufferSettings;
use crate::position::constants::{DEFAULT_GPSD_HOST, DEFAULT_GPSD_PORT};

/**
 * Percentage points one encoder detent changes the volume by.
 */
pub const DEFAULT_VOLUME_STEP: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GpsdConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GpsdConfig {
    fn default() -> Self {
        GpsdConfig {
            host: DEFAULT_GPSD_HOST.to_string(),
            port: DEFAULT_GPSD_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncoderConfig {
    pub chip: String,
    pub line_a: u32,
    pub line_b: u32,
    pub consumer: String,
    pub debounce_ms: u64,
    pub edges: EdgeMode,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            chip: DEFAULT_CHIP.to_string(),
            line_a: DEFAULT_LINE_A,
            line_b: DEFAULT_LINE_B,
            consumer: DEFAULT_CONSUMER.to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            edges: EdgeMode::Rising,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BluetoothConfig {
    pub adapter: String,
}

impl Default for BluetoothConfig {
    fn default() -> Self {
        BluetoothConfig { adapter: DEFAULT_ADAPTER.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackConfig {
    pub buffer_duration_ms: u64,
    pub buffer_size_bytes: u32,
    // 0.0 ..= 1.0
    pub initial_volume: f64,
}

impl PlaybackConfig {
    pub fn buffer(&self) -> BufferSettings {
        BufferSettings {
            duration_ms: self.buffer_duration_ms,
            size_bytes: self.buffer_size_bytes,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            buffer_duration_ms: BUFFER_DURATION_MS,
            buffer_size_bytes: BUFFER_SIZE_BYTES,
            initial_volume: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanelConfig {
    pub gpsd: GpsdConfig,
    pub encoder: EncoderConfig,
    pub bluetooth: BluetoothConfig,
    pub playback: PlaybackConfig,
    pub volume_step: u8,
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            gpsd: GpsdConfig::default(),
            encoder: EncoderConfig::default(),
            bluetooth: BluetoothConfig::default(),
            playback: PlaybackConfig::default(),
            volume_step: DEFAULT_VOLUME_STEP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: PanelConfig = serde_json::from_str(r#"{
            "gpsd": { "port": 3000 },
            "encoder": { "lineA": 5, "edges": "both" },
            "volumeStep": 10
        }"#).unwrap();

        assert_eq!(config.gpsd.host, "localhost");
        assert_eq!(config.gpsd.port, 3000);
        assert_eq!(config.encoder.line_a, 5);
        assert_eq!(config.encoder.line_b, 27);
        assert_eq!(config.encoder.edges, EdgeMode::Both);
        assert_eq!(config.encoder.consumer, "CarOS_Encoder");
        assert_eq!(config.bluetooth.adapter, "hci0");
        assert_eq!(config.playback.buffer(), BufferSettings { duration_ms: 5000, size_bytes: 1048576 });
        assert_eq!(config.volume_step, 10);
    }

    #[test]
    fn serializes_as_camel_case() {
        let json = serde_json::to_value(PanelConfig::default()).unwrap();

        assert_eq!(json["encoder"]["debounceMs"], 5);
        assert_eq!(json["encoder"]["edges"], "rising");
        assert_eq!(json["playback"]["bufferSizeBytes"], 1048576);
        assert_eq!(json["volumeStep"], 5);
    }
}
