//! Frame representation and checksum rules.

use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::*;
use crate::error::ProtocolError;

/// XOR checksum over a byte slice.
pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Whether a transmitted checksum byte is acceptable for a computed one.
///
/// Besides plain equality, pump firmware substitutes 0xC5 whenever the
/// true checksum collides with the 0x5C start marker, so that pair is
/// accepted as well.
pub fn checksum_accepted(computed: u8, received: u8) -> bool {
    computed == received || (computed == FRAME_START && received == CHECKSUM_SUBSTITUTE)
}

/// The kind of transmission slot granted by a token frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Read slot: the device may answer with data it wants the master to read.
    Read,
    /// Write slot: the device may submit a write request to the master.
    Write,
}

/// A complete, checksum-verified frame from the bus.
///
/// Owns the raw frame bytes (start marker through checksum) and exposes
/// the header fields by offset. Payload bytes are opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    raw: Bytes,
}

impl Frame {
    /// Wrap a buffer the decoder has already verified.
    pub(crate) fn from_verified(raw: Bytes) -> Self {
        Frame { raw }
    }

    /// Parse and validate a complete frame from raw bytes.
    pub fn parse(raw: impl Into<Bytes>) -> Result<Self, ProtocolError> {
        let raw = raw.into();
        if raw.len() < FRAME_OVERHEAD {
            return Err(ProtocolError::FrameTooShort {
                expected: FRAME_OVERHEAD,
                actual: raw.len(),
            });
        }
        if raw[0] != FRAME_START {
            return Err(ProtocolError::MissingStartMarker(raw[0]));
        }
        let declared = raw[LENGTH_INDEX] as usize;
        if raw.len() != declared + FRAME_OVERHEAD {
            return Err(ProtocolError::LengthMismatch {
                declared,
                actual: raw.len(),
            });
        }
        let computed = xor_checksum(&raw[1..raw.len() - 1]);
        let received = raw[raw.len() - 1];
        if !checksum_accepted(computed, received) {
            return Err(ProtocolError::ChecksumMismatch { computed, received });
        }
        Ok(Frame { raw })
    }

    /// Build a frame from header fields and payload, computing the checksum.
    ///
    /// Applies the same substitution as pump firmware: a checksum that
    /// collides with the start marker is transmitted as 0xC5.
    pub fn build(address: u8, command: u8, payload: &[u8]) -> Self {
        let mut buf = BytesMut::with_capacity(payload.len() + FRAME_OVERHEAD);
        buf.put_u8(FRAME_START);
        buf.put_u8(0x00);
        buf.put_u8(address);
        buf.put_u8(command);
        buf.put_u8(payload.len() as u8);
        buf.put_slice(payload);
        let checksum = xor_checksum(&buf[1..]);
        buf.put_u8(if checksum == FRAME_START {
            CHECKSUM_SUBSTITUTE
        } else {
            checksum
        });
        Frame { raw: buf.freeze() }
    }

    /// Address of the device this frame is directed at.
    pub fn address(&self) -> u8 {
        self.raw[ADDRESS_INDEX]
    }

    /// Command code.
    pub fn command(&self) -> u8 {
        self.raw[COMMAND_INDEX]
    }

    /// Declared payload length.
    pub fn payload_len(&self) -> usize {
        self.raw[LENGTH_INDEX] as usize
    }

    /// Payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.raw[LENGTH_INDEX + 1..self.raw.len() - 1]
    }

    /// Checksum byte as transmitted on the wire.
    pub fn checksum(&self) -> u8 {
        self.raw[self.raw.len() - 1]
    }

    /// The full raw frame, start marker through checksum.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Consume the frame, returning the raw bytes.
    pub fn into_bytes(self) -> Bytes {
        self.raw
    }

    /// Whether this frame is a bus token addressed to `own_address`, and
    /// if so which kind of slot it grants.
    ///
    /// A token is a zero-payload frame carrying a read-token or
    /// write-token command.
    pub fn token_kind(&self, own_address: u8) -> Option<TokenKind> {
        if self.address() != own_address || self.payload_len() != 0 {
            return None;
        }
        match self.command() {
            CMD_READ_TOKEN => Some(TokenKind::Read),
            CMD_WRITE_TOKEN => Some(TokenKind::Write),
            _ => None,
        }
    }
}
