//! End-to-end bridge tests over in-memory transports.
//!
//! The mocks share their state through `Rc<RefCell<...>>` handles so the
//! test can keep inspecting them after handing clones to the bridge.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nibe_gw::bridge::Bridge;
use nibe_gw::config::GatewayConfig;
use nibe_gw::serial::BusLink;
use nibe_gw::udp::{CommandSource, FrameSink};
use nibe_protocol::{ACK, NAK};

#[derive(Default)]
struct BusState {
    rx: VecDeque<u8>,
    bursts: Vec<Vec<u8>>,
}

#[derive(Clone, Default)]
struct MockBus(Rc<RefCell<BusState>>);

impl MockBus {
    fn feed(&self, bytes: &[u8]) {
        self.0.borrow_mut().rx.extend(bytes.iter().copied());
    }

    fn bursts(&self) -> Vec<Vec<u8>> {
        self.0.borrow().bursts.clone()
    }
}

impl BusLink for MockBus {
    fn ensure_open(&mut self) -> io::Result<()> {
        Ok(())
    }
    fn available(&mut self) -> bool {
        !self.0.borrow().rx.is_empty()
    }
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.0.borrow_mut().rx.pop_front())
    }
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.0.borrow_mut().bursts.push(bytes.to_vec());
        Ok(())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
    fn set_direction(&mut self, _transmit: bool) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MockSink(Rc<RefCell<Vec<Vec<u8>>>>);

impl MockSink {
    fn datagrams(&self) -> Vec<Vec<u8>> {
        self.0.borrow().clone()
    }
}

impl FrameSink for MockSink {
    fn forward(&mut self, frame: &[u8]) -> io::Result<()> {
        self.0.borrow_mut().push(frame.to_vec());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MockSource(Rc<RefCell<VecDeque<Vec<u8>>>>);

impl MockSource {
    fn queue(&self, payload: &[u8]) {
        self.0.borrow_mut().push_back(payload.to_vec());
    }

    fn pending(&self) -> usize {
        self.0.borrow().len()
    }
}

impl CommandSource for MockSource {
    fn claim(&mut self) -> Option<Vec<u8>> {
        self.0.borrow_mut().pop_front()
    }
}

struct Harness {
    bus: MockBus,
    sink: MockSink,
    read: MockSource,
    write: MockSource,
    bridge: Bridge<MockBus, MockSink, MockSource, MockSource>,
}

fn harness(config: GatewayConfig) -> Harness {
    let bus = MockBus::default();
    let sink = MockSink::default();
    let read = MockSource::default();
    let write = MockSource::default();
    let bridge = Bridge::new(
        config,
        bus.clone(),
        sink.clone(),
        read.clone(),
        write.clone(),
        Arc::new(AtomicBool::new(false)),
    );
    Harness {
        bus,
        sink,
        read,
        write,
        bridge,
    }
}

#[test]
fn valid_frame_is_acked_and_forwarded() {
    let mut h = harness(GatewayConfig::default());
    let frame = hex::decode("5C00206802AABB5B").unwrap();
    h.bus.feed(&frame);
    assert!(h.bridge.poll_once());
    assert_eq!(h.bus.bursts(), vec![vec![ACK]]);
    // Forwarded datagram is the full raw frame including the checksum.
    assert_eq!(h.sink.datagrams(), vec![frame]);
}

#[test]
fn checksum_failure_gets_a_nak_and_no_forward() {
    let mut h = harness(GatewayConfig::default());
    h.bus.feed(&hex::decode("5C00206802AABB00").unwrap());
    h.bridge.poll_once();
    assert_eq!(h.bus.bursts(), vec![vec![NAK]]);
    assert!(h.sink.datagrams().is_empty());
}

#[test]
fn write_token_relays_queued_datagram_verbatim() {
    let mut h = harness(GatewayConfig::default());
    h.write.queue(&[0xAA, 0xBB, 0xCC]);
    h.bus.feed(&hex::decode("5C00206B004B").unwrap());
    h.bridge.poll_once();
    // The payload goes out byte-identical, with no extra ACK burst, and
    // the token frame itself is not forwarded to UDP.
    assert_eq!(h.bus.bursts(), vec![vec![0xAA, 0xBB, 0xCC]]);
    assert!(h.sink.datagrams().is_empty());
}

#[test]
fn token_without_queued_datagram_is_acked() {
    let mut h = harness(GatewayConfig::default());
    h.bus.feed(&hex::decode("5C00206B004B").unwrap());
    h.bridge.poll_once();
    assert_eq!(h.bus.bursts(), vec![vec![ACK]]);
}

#[test]
fn read_token_drains_only_the_read_queue() {
    let mut h = harness(GatewayConfig::default());
    h.read.queue(&[0x01]);
    h.write.queue(&[0x02]);
    h.bus.feed(&hex::decode("5C0020690049").unwrap());
    h.bridge.poll_once();
    assert_eq!(h.bus.bursts(), vec![vec![0x01]]);
    assert_eq!(h.read.pending(), 0);
    assert_eq!(h.write.pending(), 1);
}

#[test]
fn one_datagram_per_token() {
    let mut h = harness(GatewayConfig::default());
    h.write.queue(&[0x01]);
    h.write.queue(&[0x02]);
    h.bus.feed(&hex::decode("5C00206B004B").unwrap());
    h.bridge.poll_once();
    // The second datagram stays queued until the next token.
    assert_eq!(h.bus.bursts(), vec![vec![0x01]]);
    assert_eq!(h.write.pending(), 1);
}

#[test]
fn garbage_prefix_yields_one_forwarded_frame() {
    let mut h = harness(GatewayConfig::default());
    h.bus.feed(&hex::decode("01025C0019600079").unwrap());
    h.bridge.poll_once();
    assert_eq!(
        h.sink.datagrams(),
        vec![hex::decode("5C0019600079").unwrap()]
    );
    // RMU40 acks are off by default, so nothing went back to the bus.
    assert!(h.bus.bursts().is_empty());
}

#[test]
fn forwarding_scope_can_be_restricted() {
    let config = GatewayConfig {
        forward_all: false,
        ..GatewayConfig::default()
    };
    let mut h = harness(config);
    // Frame addressed to RMU40: out of scope.
    h.bus.feed(&hex::decode("5C0019600079").unwrap());
    h.bridge.poll_once();
    assert!(h.sink.datagrams().is_empty());
    // Frame addressed to the gateway's own address: forwarded.
    let own = hex::decode("5C00206802AABB5B").unwrap();
    h.bus.feed(&own);
    h.bridge.poll_once();
    assert_eq!(h.sink.datagrams(), vec![own]);
}

#[test]
fn frames_split_across_polls_still_decode() {
    let mut h = harness(GatewayConfig::default());
    let frame = hex::decode("5C00206802AABB5B").unwrap();
    h.bus.feed(&frame[..3]);
    assert!(h.bridge.poll_once());
    assert!(h.sink.datagrams().is_empty());
    h.bus.feed(&frame[3..]);
    h.bridge.poll_once();
    assert_eq!(h.sink.datagrams(), vec![frame]);
}

#[test]
fn run_exits_on_shutdown_flag() {
    let shutdown = Arc::new(AtomicBool::new(false));
    shutdown.store(true, Ordering::SeqCst);
    let mut bridge = Bridge::new(
        GatewayConfig::default(),
        MockBus::default(),
        MockSink::default(),
        MockSource::default(),
        MockSource::default(),
        shutdown,
    );
    // Returns immediately instead of looping.
    bridge.run();
}

#[test]
fn unsolicited_datagrams_never_reach_the_bus() {
    let mut h = harness(GatewayConfig::default());
    h.write.queue(&[0xAA]);
    // A non-token frame arrives; the queued write must stay queued.
    h.bus.feed(&hex::decode("5C0019600079").unwrap());
    h.bridge.poll_once();
    assert_eq!(h.write.pending(), 1);
    assert!(h.bus.bursts().is_empty());
}
