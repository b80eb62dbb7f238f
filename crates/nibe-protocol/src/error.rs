//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when working with Nibe bus frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame is too short to contain a full header and checksum.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Declared frame size exceeds the configured maximum.
    #[error("frame too long: maximum {max} bytes, declared {actual}")]
    FrameTooLong {
        /// Maximum allowed total frame size.
        max: usize,
        /// Declared total frame size.
        actual: usize,
    },

    /// Frame does not begin with the start marker.
    #[error("missing start marker: expected 0x5C, got 0x{0:02X}")]
    MissingStartMarker(u8),

    /// Declared payload length does not match the buffer size.
    #[error("length mismatch: declared {declared} payload bytes in a {actual}-byte buffer")]
    LengthMismatch {
        /// Payload length from the header.
        declared: usize,
        /// Actual buffer size.
        actual: usize,
    },

    /// Transmitted checksum does not match the computed one.
    #[error("checksum mismatch: computed 0x{computed:02X}, received 0x{received:02X}")]
    ChecksumMismatch {
        /// Checksum computed over the frame body.
        computed: u8,
        /// Checksum byte from the wire.
        received: u8,
    },
}
