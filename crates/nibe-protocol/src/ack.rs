//! Acknowledgment policy.
//!
//! After every complete frame the bus master expects a single-byte ACK or
//! NAK from the addressed device. Which addresses the gateway answers for
//! is configuration: a gateway standing in for a MODBUS40 module must ack
//! frames addressed to 0x20, and may optionally answer for SMS40 and
//! RMU40 peripherals as well. Token frames are excluded here; the token
//! arbiter answers those (and falls back to this policy when it has no
//! payload to send).

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Which addresses the gateway acknowledges on behalf of.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AckConfig {
    /// Global enable. When false no ACK or NAK is ever sent.
    pub send_acknowledge: bool,
    /// Acknowledge every address regardless of the per-peripheral flags.
    pub ack_all: bool,
    /// Acknowledge frames addressed to MODBUS40 (0x20).
    pub ack_modbus40: bool,
    /// Acknowledge frames addressed to SMS40 (0x16).
    pub ack_sms40: bool,
    /// Acknowledge frames addressed to RMU40 (0x19).
    pub ack_rmu40: bool,
}

impl Default for AckConfig {
    fn default() -> Self {
        AckConfig {
            send_acknowledge: true,
            ack_all: false,
            ack_modbus40: true,
            ack_sms40: false,
            ack_rmu40: false,
        }
    }
}

impl AckConfig {
    /// Whether the policy applies to frames addressed to `address`.
    pub fn covers(&self, address: u8) -> bool {
        self.ack_all
            || match address {
                ADDR_MODBUS40 => self.ack_modbus40,
                ADDR_SMS40 => self.ack_sms40,
                ADDR_RMU40 => self.ack_rmu40,
                _ => false,
            }
    }
}

/// How a received frame terminated, as far as acknowledgment is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Frame decoded with an accepted checksum.
    Valid,
    /// Frame completed but the checksum did not match.
    ChecksumFailed,
}

/// What to put on the wire in response to a received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckDecision {
    /// Transmit a single ACK byte.
    SendAck,
    /// Transmit a single NAK byte.
    SendNak,
    /// Stay silent.
    SendNothing,
}

impl AckDecision {
    /// The byte to transmit, if any.
    pub fn wire_byte(self) -> Option<u8> {
        match self {
            AckDecision::SendAck => Some(ACK),
            AckDecision::SendNak => Some(NAK),
            AckDecision::SendNothing => None,
        }
    }
}

/// Decide the acknowledgment for a frame addressed to `address`.
pub fn decide(address: u8, status: FrameStatus, config: &AckConfig) -> AckDecision {
    if !config.send_acknowledge || !config.covers(address) {
        return AckDecision::SendNothing;
    }
    match status {
        FrameStatus::Valid => AckDecision::SendAck,
        FrameStatus::ChecksumFailed => AckDecision::SendNak,
    }
}
