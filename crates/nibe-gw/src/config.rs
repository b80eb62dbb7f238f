//! Gateway configuration.
//!
//! Settings load from an optional YAML file and can be overridden field
//! by field from the command line. Everything has a sensible default, so
//! running with no configuration at all talks to `/dev/ttyUSB0` and
//! forwards to localhost.

use std::fs;
use std::path::Path;
use std::time::Duration;

use nibe_protocol::{AckConfig, ADDR_MODBUS40, DEFAULT_MAX_FRAME_SIZE};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Serial link settings. Link parameters are fixed by the pump
/// (9600 baud, 8N1); only the device path and transceiver handling vary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial device path.
    pub device: String,
    /// Drive the RTS line as half-duplex direction control. Disable for
    /// transceivers with automatic turnaround.
    pub direction_control: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            device: "/dev/ttyUSB0".to_string(),
            direction_control: true,
        }
    }
}

/// UDP endpoints: one outbound destination for forwarded frames and two
/// inbound command ports drained during token windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UdpConfig {
    /// Host receiving forwarded frames.
    pub target_host: String,
    /// Port receiving forwarded frames.
    pub target_port: u16,
    /// Local port accepting read-command datagrams.
    pub read_port: u16,
    /// Local port accepting write-command datagrams.
    pub write_port: u16,
}

impl Default for UdpConfig {
    fn default() -> Self {
        UdpConfig {
            target_host: "127.0.0.1".to_string(),
            target_port: 9999,
            read_port: 9999,
            write_port: 10000,
        }
    }
}

/// Complete gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Serial link settings.
    pub serial: SerialConfig,
    /// UDP endpoint settings.
    pub udp: UdpConfig,
    /// Acknowledgment address filters.
    pub ack: AckConfig,
    /// The modbus address this gateway answers tokens for.
    pub own_address: u8,
    /// Forward every validated frame. When false only frames addressed
    /// to `own_address` are forwarded.
    pub forward_all: bool,
    /// Maximum total frame size accepted by the decoder. Pump firmware
    /// revisions disagree on the exact bound, so it is a setting.
    pub max_frame_size: usize,
    /// Sleep per idle loop iteration, in milliseconds.
    pub poll_interval_ms: u64,
    /// Transceiver settle delay around each transmission, in milliseconds.
    pub settle_delay_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            serial: SerialConfig::default(),
            udp: UdpConfig::default(),
            ack: AckConfig::default(),
            own_address: ADDR_MODBUS40,
            forward_all: true,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            poll_interval_ms: 10,
            settle_delay_ms: 1,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, GatewayError> {
        let text = fs::read_to_string(path).map_err(|source| GatewayError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| GatewayError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Idle sleep between empty loop iterations.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Settle delay on each direction-control transition.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
