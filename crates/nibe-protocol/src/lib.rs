//! Nibe Heat Pump RS-485 Protocol
//!
//! This crate provides the framing, checksum, and acknowledgment rules for
//! the proprietary serial protocol spoken by Nibe heat pumps on their
//! RS-485 accessory bus. It is pure data transformation: no I/O happens
//! here.
//!
//! # Protocol Overview
//!
//! Every message on the bus is a checksum-delimited frame:
//!
//! ```text
//! +------+------+---------+---------+-----+----------------+----------+
//! | 0x5C | 0x00 | address | command | len | payload[0:len] | checksum |
//! +------+------+---------+---------+-----+----------------+----------+
//! ```
//!
//! The checksum is the XOR of every byte between the start marker and the
//! checksum byte itself. The pump master polls each accessory address in
//! turn; a zero-length frame with a read-token (0x69) or write-token
//! (0x6B) command grants the addressed device one transmission slot on
//! the half-duplex bus. All other frames are acknowledged with a single
//! ACK (0x06) or NAK (0x15) byte.
//!
//! # Example
//!
//! ```rust,ignore
//! use nibe_protocol::{FrameDecoder, Outcome};
//!
//! let mut decoder = FrameDecoder::new();
//! for byte in received {
//!     match decoder.feed(byte) {
//!         Outcome::FrameReady(frame) => handle(frame),
//!         Outcome::ChecksumFailure { .. } => nak(),
//!         _ => {}
//!     }
//! }
//! ```

mod ack;
mod constants;
mod decoder;
mod error;
mod frame;

pub use ack::*;
pub use constants::*;
pub use decoder::*;
pub use error::*;
pub use frame::*;
