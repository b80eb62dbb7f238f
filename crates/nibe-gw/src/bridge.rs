//! The bridge loop.
//!
//! A single-threaded cooperative scheduler: every iteration makes sure
//! the transports are open, drains whatever the serial port has, acts on
//! each decoder outcome inline (ack, nak, token answer, UDP forward),
//! and sleeps one poll interval when nothing happened. Nothing here ever
//! blocks indefinitely, and no transport failure is fatal; the loop only
//! exits when the shutdown flag is raised.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use nibe_protocol::{decide, FrameDecoder, FrameStatus, Outcome};
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::serial::BusLink;
use crate::token::answer_token;
use crate::udp::{CommandSource, FrameSink};

/// Log transport state transitions without spamming every iteration.
fn track(ok: &mut bool, name: &str, result: io::Result<()>) {
    match result {
        Ok(()) => {
            if !*ok {
                info!("{} transport ready", name);
                *ok = true;
            }
        }
        Err(e) => {
            if *ok {
                warn!("{} transport unavailable, will retry: {}", name, e);
                *ok = false;
            }
        }
    }
}

/// The gateway orchestrator, generic over its transports.
pub struct Bridge<B, S, R, W> {
    config: GatewayConfig,
    decoder: FrameDecoder,
    bus: B,
    sink: S,
    read_commands: R,
    write_commands: W,
    shutdown: Arc<AtomicBool>,
    bus_ok: bool,
    sink_ok: bool,
    read_ok: bool,
    write_ok: bool,
}

impl<B, S, R, W> Bridge<B, S, R, W>
where
    B: BusLink,
    S: FrameSink,
    R: CommandSource,
    W: CommandSource,
{
    /// Assemble a bridge from its transports.
    pub fn new(
        config: GatewayConfig,
        bus: B,
        sink: S,
        read_commands: R,
        write_commands: W,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        let decoder = FrameDecoder::with_max_frame_size(config.max_frame_size);
        Bridge {
            config,
            decoder,
            bus,
            sink,
            read_commands,
            write_commands,
            shutdown,
            // Start pessimistic so the first successful open is logged.
            bus_ok: false,
            sink_ok: false,
            read_ok: false,
            write_ok: false,
        }
    }

    /// Run until the shutdown flag is raised.
    ///
    /// Transports are closed by drop on return; a partially accumulated
    /// frame is simply discarded.
    pub fn run(&mut self) {
        info!(
            "bridge running: own address 0x{:02X}, forward_all={}",
            self.config.own_address, self.config.forward_all
        );
        while !self.shutdown.load(Ordering::SeqCst) {
            let busy = self.poll_once();
            if !busy {
                thread::sleep(self.config.poll_interval());
            }
        }
        info!("shutdown requested, closing transports");
    }

    /// One loop iteration: heal transports, then drain the serial input.
    /// Returns whether any byte was processed.
    pub fn poll_once(&mut self) -> bool {
        self.ensure_transports();
        self.pump_serial()
    }

    fn ensure_transports(&mut self) {
        track(&mut self.bus_ok, "serial", self.bus.ensure_open());
        track(&mut self.sink_ok, "udp target", self.sink.ensure_open());
        track(
            &mut self.read_ok,
            "read commands",
            self.read_commands.ensure_open(),
        );
        track(
            &mut self.write_ok,
            "write commands",
            self.write_commands.ensure_open(),
        );
    }

    fn pump_serial(&mut self) -> bool {
        let mut busy = false;
        loop {
            match self.bus.read_byte() {
                Ok(Some(byte)) => {
                    busy = true;
                    let outcome = self.decoder.feed(byte);
                    self.handle_outcome(outcome);
                }
                Ok(None) => break,
                Err(e) => {
                    track(&mut self.bus_ok, "serial", Err(e));
                    break;
                }
            }
        }
        busy
    }

    fn handle_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Incomplete => {}
            Outcome::Invalid => {
                debug!("dropped malformed accumulation");
            }
            Outcome::ChecksumFailure {
                computed,
                received,
                address,
            } => {
                debug!(
                    "checksum failure for 0x{:02X}: computed 0x{:02X}, received 0x{:02X}",
                    address, computed, received
                );
                let decision = decide(address, FrameStatus::ChecksumFailed, &self.config.ack);
                if let Some(byte) = decision.wire_byte() {
                    self.transmit(&[byte]);
                }
            }
            Outcome::FrameReady(frame) => {
                debug!(
                    "rx frame: addr=0x{:02X} cmd=0x{:02X} len={}",
                    frame.address(),
                    frame.command(),
                    frame.payload_len()
                );
                if let Some(kind) = frame.token_kind(self.config.own_address) {
                    let settle = self.config.settle_delay();
                    let result = answer_token(
                        kind,
                        frame.address(),
                        &mut self.bus,
                        &mut self.read_commands,
                        &mut self.write_commands,
                        &self.config.ack,
                        settle,
                    );
                    match result {
                        Ok(action) => debug!("{:?} token: {:?}", kind, action),
                        Err(e) => track(&mut self.bus_ok, "serial", Err(e)),
                    }
                    // Tokens are bus arbitration, not data; they are not
                    // forwarded.
                    return;
                }
                let decision = decide(frame.address(), FrameStatus::Valid, &self.config.ack);
                if let Some(byte) = decision.wire_byte() {
                    self.transmit(&[byte]);
                }
                if self.config.forward_all || frame.address() == self.config.own_address {
                    let result = self.sink.forward(frame.as_bytes());
                    track(&mut self.sink_ok, "udp target", result);
                }
            }
        }
    }

    fn transmit(&mut self, bytes: &[u8]) {
        let settle = self.config.settle_delay();
        let result = self.bus.transmit(bytes, settle);
        track(&mut self.bus_ok, "serial", result);
    }
}
