//! Nibe RS-485 to UDP gateway.
//!
//! The gateway sits on the heat pump's accessory bus, impersonating a
//! MODBUS40 module: it decodes frames, acknowledges them, answers the
//! read/write tokens the pump grants it, and bridges payloads to and
//! from UDP. Protocol rules live in the `nibe-protocol` crate; this
//! crate supplies the transports and the single-threaded bridge loop
//! that drives them.

pub mod bridge;
pub mod cli;
pub mod config;
pub mod error;
pub mod serial;
pub mod token;
pub mod udp;

pub use bridge::Bridge;
pub use config::GatewayConfig;
pub use error::GatewayError;
