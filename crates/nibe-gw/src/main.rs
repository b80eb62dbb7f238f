//! Gateway binary entry point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nibe_gw::bridge::Bridge;
use nibe_gw::cli::Cli;
use nibe_gw::config::GatewayConfig;
use nibe_gw::error::GatewayError;
use nibe_gw::serial::SerialBusLink;
use nibe_gw::udp::{UdpCommandSource, UdpFrameSink};

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run() -> Result<(), GatewayError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => GatewayConfig::load(path)?,
        None => GatewayConfig::default(),
    };
    cli.apply_to(&mut config);

    info!(
        "nibegw starting: device={} target={}:{} read_port={} write_port={} own_address=0x{:02X}",
        config.serial.device,
        config.udp.target_host,
        config.udp.target_port,
        config.udp.read_port,
        config.udp.write_port,
        config.own_address
    );
    info!(
        "ack filters: enabled={} all={} modbus40={} sms40={} rmu40={}",
        config.ack.send_acknowledge,
        config.ack.ack_all,
        config.ack.ack_modbus40,
        config.ack.ack_sms40,
        config.ack.ack_rmu40
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    let bus = SerialBusLink::new(config.serial.device.clone(), config.serial.direction_control);
    let sink = UdpFrameSink::new(config.udp.target_host.clone(), config.udp.target_port);
    let read_commands = UdpCommandSource::new("read commands", config.udp.read_port);
    let write_commands = UdpCommandSource::new("write commands", config.udp.write_port);

    let mut bridge = Bridge::new(config, bus, sink, read_commands, write_commands, shutdown);
    bridge.run();
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
