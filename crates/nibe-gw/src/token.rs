//! Token arbitration.
//!
//! The pump master grants the gateway one transmission slot at a time by
//! sending a zero-length token frame to its address. A read token lets
//! the gateway answer with data, a write token lets it submit a write
//! request. Outside these windows the gateway never transmits payloads;
//! that is what keeps the shared half-duplex bus orderly.

use std::io;
use std::time::Duration;

use nibe_protocol::{decide, AckConfig, FrameStatus, TokenKind};
use tracing::debug;

use crate::serial::BusLink;
use crate::udp::CommandSource;

/// What the arbiter did in response to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAction {
    /// A queued command payload of this many bytes was relayed.
    Relayed(usize),
    /// No payload was queued; a plain ACK was sent instead.
    Acked,
    /// No payload was queued and the ACK policy stayed silent.
    Ignored,
}

/// Answer one token frame addressed to the gateway.
///
/// Drains at most one datagram from the queue matching the token kind
/// and relays it verbatim. A relayed payload replaces the ACK; with
/// nothing to send, the ordinary acknowledgment policy applies.
pub fn answer_token<'a>(
    kind: TokenKind,
    address: u8,
    bus: &mut dyn BusLink,
    read_commands: &'a mut dyn CommandSource,
    write_commands: &'a mut dyn CommandSource,
    ack: &AckConfig,
    settle: Duration,
) -> io::Result<TokenAction> {
    let source = match kind {
        TokenKind::Read => read_commands,
        TokenKind::Write => write_commands,
    };
    // An empty datagram is claimed but carries nothing to relay.
    if let Some(payload) = source.claim().filter(|p| !p.is_empty()) {
        debug!("{:?} token: relaying {} byte payload", kind, payload.len());
        bus.transmit(&payload, settle)?;
        return Ok(TokenAction::Relayed(payload.len()));
    }
    match decide(address, FrameStatus::Valid, ack).wire_byte() {
        Some(byte) => {
            bus.transmit(&[byte], settle)?;
            Ok(TokenAction::Acked)
        }
        None => Ok(TokenAction::Ignored),
    }
}
