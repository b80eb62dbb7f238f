//! Serial bus transport.
//!
//! The RS-485 side of the bridge. `BusLink` is the seam the bridge loop
//! and the token arbiter talk through, so tests can substitute an
//! in-memory transport; `SerialBusLink` is the real implementation over
//! the `serialport` crate.
//!
//! The bus is half-duplex: the transceiver must be switched into
//! transmit mode before driving data and back to receive mode after,
//! with a short settle delay on each transition. `transmit` brackets
//! every outbound burst accordingly, so no caller can forget it.

use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

use tracing::debug;

/// Fixed link rate dictated by the pump.
pub const BAUD_RATE: u32 = 9600;

/// Non-blocking byte transport onto the RS-485 bus.
pub trait BusLink {
    /// Open the underlying device if it is not already open.
    fn ensure_open(&mut self) -> io::Result<()>;

    /// Whether at least one received byte is waiting.
    fn available(&mut self) -> bool;

    /// Take one received byte, or `None` when the line is idle.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Queue bytes for transmission. Callers should go through
    /// [`BusLink::transmit`] instead so direction control is applied.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Push queued bytes onto the wire.
    fn flush(&mut self) -> io::Result<()>;

    /// Switch the transceiver between transmit (`true`) and receive.
    fn set_direction(&mut self, transmit: bool) -> io::Result<()>;

    /// Transmit one burst with direction-control bracketing.
    ///
    /// The transceiver is returned to receive mode even when the write
    /// itself fails, so a fault never leaves the bus driven.
    fn transmit(&mut self, bytes: &[u8], settle: Duration) -> io::Result<()> {
        self.set_direction(true)?;
        thread::sleep(settle);
        let result = self.write(bytes).and_then(|_| self.flush());
        thread::sleep(settle);
        self.set_direction(false)?;
        result
    }
}

/// `BusLink` over a real serial port, 9600 8N1.
///
/// The port handle is dropped on any I/O error and reopened by the next
/// `ensure_open` call, which the bridge issues every iteration.
pub struct SerialBusLink {
    device: String,
    direction_control: bool,
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl SerialBusLink {
    /// Create an unopened link for the given device path.
    pub fn new(device: impl Into<String>, direction_control: bool) -> Self {
        SerialBusLink {
            device: device.into(),
            direction_control,
            port: None,
        }
    }

    fn open(&mut self) -> io::Result<()> {
        let mut port = serialport::new(&self.device, BAUD_RATE)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(Duration::from_millis(10))
            .open()
            .map_err(io::Error::from)?;
        if self.direction_control {
            // Start in receive mode.
            port.write_request_to_send(false)
                .map_err(io::Error::from)?;
        }
        debug!("opened serial device {}", self.device);
        self.port = Some(port);
        Ok(())
    }

    /// Drop the port so the next `ensure_open` reopens it.
    fn mark_closed(&mut self) {
        self.port = None;
    }

    fn port(&mut self) -> io::Result<&mut Box<dyn serialport::SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "serial port not open"))
    }
}

impl BusLink for SerialBusLink {
    fn ensure_open(&mut self) -> io::Result<()> {
        if self.port.is_none() {
            self.open()?;
        }
        Ok(())
    }

    fn available(&mut self) -> bool {
        match self.port.as_mut().map(|p| p.bytes_to_read()) {
            Some(Ok(n)) => n > 0,
            Some(Err(_)) => {
                self.mark_closed();
                false
            }
            None => false,
        }
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if !self.available() {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        match self.port()?.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) => {
                self.mark_closed();
                Err(e)
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self.port()?.write_all(bytes) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.mark_closed();
                Err(e)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.port()?.flush() {
            Ok(()) => Ok(()),
            Err(e) => {
                self.mark_closed();
                Err(e)
            }
        }
    }

    fn set_direction(&mut self, transmit: bool) -> io::Result<()> {
        if !self.direction_control {
            return Ok(());
        }
        match self.port()?.write_request_to_send(transmit) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.mark_closed();
                Err(io::Error::from(e))
            }
        }
    }
}
