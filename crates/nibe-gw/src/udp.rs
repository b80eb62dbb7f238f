//! UDP transports.
//!
//! One outbound destination receives every forwarded frame; two inbound
//! sockets accept command datagrams that are relayed onto the bus when
//! the matching token arrives. Both sides are polled non-blocking from
//! the single bridge thread, and both reopen themselves after a failure
//! on the next `ensure_open`.
//!
//! Forwarded datagrams carry the full raw frame, start marker through
//! checksum byte, so consumers can re-validate independently.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use tracing::{debug, warn};

/// Largest inbound command datagram accepted. Commands are relayed onto
/// the bus verbatim, so anything near the frame-size bound is already
/// suspect; oversized datagrams are truncated by the OS recv.
const MAX_DATAGRAM: usize = 512;

/// Destination for validated frames leaving the bus.
pub trait FrameSink {
    /// Open the underlying socket if needed.
    fn ensure_open(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Forward one frame's raw bytes.
    fn forward(&mut self, frame: &[u8]) -> io::Result<()>;
}

/// Source of command payloads to relay during token windows.
pub trait CommandSource {
    /// Open the underlying socket if needed.
    fn ensure_open(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Claim exactly one waiting datagram, if any. Never blocks.
    fn claim(&mut self) -> Option<Vec<u8>>;
}

/// `FrameSink` sending datagrams to a configured host and port.
pub struct UdpFrameSink {
    target_host: String,
    target_port: u16,
    target: Option<SocketAddr>,
    socket: Option<UdpSocket>,
}

impl UdpFrameSink {
    /// Create an unopened sink for the given destination.
    pub fn new(target_host: impl Into<String>, target_port: u16) -> Self {
        UdpFrameSink {
            target_host: target_host.into(),
            target_port,
            target: None,
            socket: None,
        }
    }
}

impl FrameSink for UdpFrameSink {
    fn ensure_open(&mut self) -> io::Result<()> {
        if self.target.is_none() {
            let addr = (self.target_host.as_str(), self.target_port)
                .to_socket_addrs()?
                .next()
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::AddrNotAvailable,
                        format!("no address for {}", self.target_host),
                    )
                })?;
            self.target = Some(addr);
        }
        if self.socket.is_none() {
            self.socket = Some(UdpSocket::bind("0.0.0.0:0")?);
            debug!(
                "forwarding frames to {}:{}",
                self.target_host, self.target_port
            );
        }
        Ok(())
    }

    fn forward(&mut self, frame: &[u8]) -> io::Result<()> {
        let (socket, target) = match (self.socket.as_ref(), self.target) {
            (Some(s), Some(t)) => (s, t),
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::NotConnected,
                    "outbound socket not open",
                ))
            }
        };
        match socket.send_to(frame, target) {
            Ok(_) => Ok(()),
            Err(e) => {
                self.socket = None;
                Err(e)
            }
        }
    }
}

/// `CommandSource` reading datagrams from a bound local port.
pub struct UdpCommandSource {
    label: &'static str,
    port: u16,
    socket: Option<UdpSocket>,
}

impl UdpCommandSource {
    /// Create an unopened source listening on the given port.
    pub fn new(label: &'static str, port: u16) -> Self {
        UdpCommandSource {
            label,
            port,
            socket: None,
        }
    }
}

impl CommandSource for UdpCommandSource {
    fn ensure_open(&mut self) -> io::Result<()> {
        if self.socket.is_none() {
            let socket = UdpSocket::bind(("0.0.0.0", self.port))?;
            socket.set_nonblocking(true)?;
            debug!("listening for {} on udp port {}", self.label, self.port);
            self.socket = Some(socket);
        }
        Ok(())
    }

    fn claim(&mut self) -> Option<Vec<u8>> {
        let socket = self.socket.as_ref()?;
        let mut buf = [0u8; MAX_DATAGRAM];
        match socket.recv_from(&mut buf) {
            Ok((n, peer)) => {
                debug!("{}: claimed {} bytes from {}", self.label, n, peer);
                Some(buf[..n].to_vec())
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => None,
            Err(e) => {
                warn!("{}: receive failed, reopening socket: {}", self.label, e);
                self.socket = None;
                None
            }
        }
    }
}
