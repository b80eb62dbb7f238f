//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::GatewayConfig;

/// Parse a byte given as decimal or 0x-prefixed hex.
fn parse_byte(s: &str) -> Result<u8, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        s.parse().map_err(|e: std::num::ParseIntError| e.to_string())
    }
}

/// RS-485 to UDP gateway for Nibe heat pumps.
#[derive(Debug, Parser)]
#[command(name = "nibegw", version, about)]
pub struct Cli {
    /// Path to a YAML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Serial device connected to the RS-485 transceiver.
    #[arg(short, long)]
    pub device: Option<String>,

    /// Host receiving forwarded frames.
    #[arg(long)]
    pub target_host: Option<String>,

    /// Port receiving forwarded frames.
    #[arg(long)]
    pub target_port: Option<u16>,

    /// Local UDP port accepting read-command datagrams.
    #[arg(long)]
    pub read_port: Option<u16>,

    /// Local UDP port accepting write-command datagrams.
    #[arg(long)]
    pub write_port: Option<u16>,

    /// Modbus address the gateway answers tokens for (decimal or 0x hex).
    #[arg(long, value_parser = parse_byte)]
    pub own_address: Option<u8>,

    /// Forward every validated frame, or only those addressed to the
    /// gateway.
    #[arg(long)]
    pub forward_all: Option<bool>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply_to(&self, config: &mut GatewayConfig) {
        if let Some(device) = &self.device {
            config.serial.device = device.clone();
        }
        if let Some(host) = &self.target_host {
            config.udp.target_host = host.clone();
        }
        if let Some(port) = self.target_port {
            config.udp.target_port = port;
        }
        if let Some(port) = self.read_port {
            config.udp.read_port = port;
        }
        if let Some(port) = self.write_port {
            config.udp.write_port = port;
        }
        if let Some(address) = self.own_address {
            config.own_address = address;
        }
        if let Some(forward_all) = self.forward_all {
            config.forward_all = forward_all;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_byte_forms() {
        assert_eq!(parse_byte("32"), Ok(0x20));
        assert_eq!(parse_byte("0x20"), Ok(0x20));
        assert_eq!(parse_byte("0X19"), Ok(0x19));
        assert!(parse_byte("0x100").is_err());
        assert!(parse_byte("pump").is_err());
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::parse_from([
            "nibegw",
            "--device",
            "/dev/ttyS2",
            "--own-address",
            "0x19",
            "--write-port",
            "12000",
        ]);
        let mut config = GatewayConfig::default();
        cli.apply_to(&mut config);
        assert_eq!(config.serial.device, "/dev/ttyS2");
        assert_eq!(config.own_address, 0x19);
        assert_eq!(config.udp.write_port, 12000);
        // Untouched fields keep their defaults.
        assert_eq!(config.udp.read_port, 9999);
    }
}
