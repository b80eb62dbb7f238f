//! Protocol constants
//!
//! These constants define the framing bytes, device addresses, and command
//! codes used on the Nibe RS-485 accessory bus.

// ============================================================================
// Framing
// ============================================================================

/// Start-of-frame marker. Every frame on the bus begins with this byte.
pub const FRAME_START: u8 = 0x5C;
/// Positive acknowledgment, sent back to the master after a valid frame.
pub const ACK: u8 = 0x06;
/// Negative acknowledgment, sent back after a checksum failure.
pub const NAK: u8 = 0x15;
/// Substitute checksum byte transmitted by pump firmware when the true
/// checksum would collide with [`FRAME_START`].
pub const CHECKSUM_SUBSTITUTE: u8 = 0xC5;

// ============================================================================
// Device addresses
// ============================================================================

/// SMS40 accessory module.
pub const ADDR_SMS40: u8 = 0x16;
/// RMU40 room unit.
pub const ADDR_RMU40: u8 = 0x19;
/// MODBUS40 communication module (the identity a gateway usually assumes).
pub const ADDR_MODBUS40: u8 = 0x20;

// ============================================================================
// Command codes
// ============================================================================

/// Zero-length frame granting the addressed device a read slot.
pub const CMD_READ_TOKEN: u8 = 0x69;
/// Zero-length frame granting the addressed device a write slot.
pub const CMD_WRITE_TOKEN: u8 = 0x6B;

// ============================================================================
// Sizes and offsets
// ============================================================================

/// Byte offset of the device address within a frame.
pub const ADDRESS_INDEX: usize = 2;
/// Byte offset of the command code within a frame.
pub const COMMAND_INDEX: usize = 3;
/// Byte offset of the payload length within a frame.
pub const LENGTH_INDEX: usize = 4;
/// Number of non-payload bytes in a frame (start, 0x00, address, command,
/// length, checksum). Total frame size is payload length plus this.
pub const FRAME_OVERHEAD: usize = 6;
/// Default upper bound on total frame size. Pump firmware revisions
/// disagree on the exact limit, so the decoder makes it configurable.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 128;
