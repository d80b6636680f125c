//! Command implementations for the f1telemetry CLI

pub mod decode;
pub mod listen;

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::Args;
use f1_telemetry_udp::IngestorConfig;
use f1_telemetry_udp::config::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_HOST, DEFAULT_INTERVAL_MS, DEFAULT_PORT, DEFAULT_TIMEOUT_MS,
    ENV_HOST, ENV_INTERVAL_MS, ENV_PORT, ENV_TIMEOUT_MS,
};

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// IPv4 address to bind
    #[arg(long, env = ENV_HOST, default_value_t = DEFAULT_HOST)]
    pub host: Ipv4Addr,

    /// UDP port to bind (0 picks a free port)
    #[arg(short, long, env = ENV_PORT, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Milliseconds between printed snapshots
    #[arg(long, env = ENV_INTERVAL_MS, default_value_t = DEFAULT_INTERVAL_MS)]
    pub interval_ms: u64,

    /// Milliseconds of silence before the source counts as disconnected
    #[arg(long, env = ENV_TIMEOUT_MS, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Exit after this many snapshots instead of running until Ctrl-C
    #[arg(long)]
    pub ticks: Option<u64>,
}

impl ListenArgs {
    pub fn to_config(&self) -> IngestorConfig {
        IngestorConfig::default()
            .with_host(self.host)
            .with_port(self.port)
            .with_interval_ms(self.interval_ms)
            .with_timeout_ms(self.timeout_ms)
            .with_channel_capacity(DEFAULT_CHANNEL_CAPACITY)
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// File holding one raw datagram
    pub file: PathBuf,

    /// Fail when the packet is shorter than the full layout
    #[arg(long)]
    pub strict: bool,
}
